use std::{fmt, str::FromStr};

/// USB vendor/product pair identifying the target printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrinterId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl PrinterId {
    /// The label printer the agent ships configured for.
    pub const DEFAULT: PrinterId = PrinterId {
        vendor_id: 0x4B43,
        product_id: 0x3538,
    };

    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        PrinterId {
            vendor_id,
            product_id,
        }
    }

    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        self.vendor_id == vid && self.product_id == pid
    }
}

impl Default for PrinterId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PrinterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Parse `VID:PID` written in hex, e.g. `4b43:3538` or `0x4B43:0x3538`.
impl FromStr for PrinterId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (vid, pid) = s
            .split_once(':')
            .ok_or_else(|| format!("expected VID:PID, got {:?}", s))?;

        Ok(PrinterId {
            vendor_id: parse_hex(vid)?,
            product_id: parse_hex(pid)?,
        })
    }
}

fn parse_hex(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid id {:?}: {}", s, e))
}
