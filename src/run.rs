use std::io::Write;

use tracing::{debug, error, info};

use crate::cli::Args;
use crate::config::{Strategy, UploadRequest};
use crate::error::Result;
use crate::orchestrator;
use crate::uploader::{self, Receipt, Uploader};

pub async fn run(args: Args) -> u8 {
    let mut stdout = std::io::stdout();
    run_with(
        args,
        |var| std::env::var(var).ok(),
        uploader::for_request,
        &mut stdout,
    )
    .await
}

/// Resolves the request, uploads it and returns the process exit status.
/// The uploader is only built once credentials are known to be present.
pub async fn run_with<E, F, W>(args: Args, env: E, make_uploader: F, out: &mut W) -> u8
where
    E: Fn(&str) -> Option<String>,
    F: FnOnce(&UploadRequest) -> Result<Box<dyn Uploader>>,
    W: Write,
{
    let request = match UploadRequest::resolve(args, env) {
        Ok(request) => request,
        Err(err) => {
            error!("{}", err);
            return err.exit_status(false);
        }
    };

    let lenient = request.lenient_exit;
    let quiet = request.strategy == Strategy::Put;
    let result = match make_uploader(&request) {
        Ok(uploader) => orchestrator::upload(request, uploader.as_ref()).await,
        Err(err) => Err(err),
    };

    report(result, lenient, quiet, out)
}

fn report<W: Write>(result: Result<Receipt>, lenient: bool, quiet: bool, out: &mut W) -> u8 {
    match result {
        Ok(receipt) => {
            let e_tag = receipt.e_tag.as_deref().unwrap_or_default();
            if quiet {
                debug!(location = %receipt.location, e_tag = %e_tag, "upload complete");
            } else {
                info!(location = %receipt.location, "upload complete");
                debug!(e_tag = %e_tag, "upload complete");
            }
            0
        }
        Err(err) if lenient && err.is_upload() => {
            if let Err(write_err) = writeln!(out, "{}", single_line(&err.to_string())) {
                error!("failed to report upload error: {}", write_err);
            }
            err.exit_status(true)
        }
        Err(err) => {
            error!("{}", single_line(&err.to_string()));
            err.exit_status(false)
        }
    }
}

/// Service error bodies can span several lines; diagnostics are one line.
fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_joins_multiline_bodies() {
        let body = "Request ID: None Body: <?xml version=\"1.0\"?>\n  <Error>\n<Code>AccessDenied</Code>\n</Error>\n";
        assert_eq!(
            single_line(body),
            "Request ID: None Body: <?xml version=\"1.0\"?> <Error> <Code>AccessDenied</Code> </Error>"
        );
    }

    #[test]
    fn lenient_report_writes_one_line() {
        let mut out = Vec::new();
        let err = crate::Error::upload("Body: <Error>\n<Code>AccessDenied</Code>\n</Error>");

        assert_eq!(report(Err(err), true, true, &mut out), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Body: <Error> <Code>AccessDenied</Code> </Error>\n"
        );
    }
}
