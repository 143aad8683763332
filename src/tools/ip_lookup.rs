//! IP to location.

use crate::geo::{GeoLookup, IpRecord};

use super::{Checked, ToolError};

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter an IP address.";

/// Non-empty after trimming; the trimmed value is what gets looked up.
pub fn check(input: &str) -> Result<Checked, ToolError> {
    let ip = input.trim();
    if ip.is_empty() {
        return Err(ToolError::Validation(EMPTY_INPUT_MESSAGE.to_string()));
    }
    Ok(Checked::Dispatch(ip.to_string()))
}

pub async fn run(geo: &dyn GeoLookup, ip: &str) -> Result<IpRecord, ToolError> {
    Ok(geo.resolve_ip(ip).await?)
}
