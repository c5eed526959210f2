// Uniform error gate for call-level return codes
//
// Every driver call in the crate routes its return code through `check`, so
// diagnostics are walked and aggregated in exactly one place and callers only
// decide which error variant the formatted detail belongs in.

use std::fmt;

use tracing::debug;

use crate::odbc::interface::{HandleKind, OdbcDriver, RawHandle, SqlCode};

/// Aggregated diagnostic detail for one failed call-level function.
///
/// Displays as the context string followed by every diagnostic record the
/// driver reported, oldest first.
#[derive(Debug)]
pub(crate) struct DiagnosticFailure {
    context: &'static str,
    code: SqlCode,
    detail: String,
}

impl fmt::Display for DiagnosticFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}): {}", self.context, self.code, self.detail)
    }
}

/// Gate a call-level return code.
///
/// Unqualified success passes through. Anything else is a failure:
/// `Error` and `SuccessWithInfo` walk the handle's diagnostic area and
/// aggregate every record into the failure detail; other codes (and calls
/// with no handle to interrogate) produce a generic detail.
pub(crate) fn check(
    driver: &dyn OdbcDriver,
    code: SqlCode,
    kind: HandleKind,
    handle: Option<RawHandle>,
    context: &'static str,
) -> Result<(), DiagnosticFailure> {
    if code.is_success() {
        return Ok(());
    }

    debug!(?code, context, "call-level function did not succeed");

    let detail = match (code, handle) {
        (SqlCode::Error | SqlCode::SuccessWithInfo, Some(handle)) => {
            walk_records(driver, kind, handle)
        }
        _ => String::from("no additional information available"),
    };

    Err(DiagnosticFailure {
        context,
        code,
        detail,
    })
}

/// Walk the diagnostic area from record 1 until the driver stops returning
/// records, concatenating each one.
fn walk_records(driver: &dyn OdbcDriver, kind: HandleKind, handle: RawHandle) -> String {
    let mut aggregated = String::new();
    let mut record: i16 = 1;
    loop {
        let (status, diag) = driver.diag_record(kind, handle, record);
        if !status.is_success() && status != SqlCode::SuccessWithInfo {
            break;
        }
        if let Some(diag) = diag {
            aggregated.push_str(&format!(
                "[{} {} {}: {}] ",
                diag.state, record, diag.native_code, diag.message
            ));
        }
        if status != SqlCode::Success {
            break;
        }
        record += 1;
    }
    if aggregated.is_empty() {
        aggregated.push_str("no additional information available");
    }
    aggregated
}
