//! Status Word (SW) constants returned by contactless readers

/// Status Word constants
pub struct SW;

impl SW {
    pub const SUCCESS: u16 = 0x9000;

    /// Generic failure reported by most readers for rejected page access
    pub const OPERATION_FAILED: u16 = 0x6300;

    pub const WRONG_LENGTH: u16 = 0x6700;
    pub const COMMAND_NOT_ALLOWED: u16 = 0x6986;
    pub const FUNCTION_NOT_SUPPORTED: u16 = 0x6A81;
    pub const WRONG_P1_P2: u16 = 0x6B00;
    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;
    pub const CLA_NOT_SUPPORTED: u16 = 0x6E00;

    /// Short human readable meaning of a status word
    pub fn describe(sw: u16) -> &'static str {
        match sw {
            Self::SUCCESS => "success",
            Self::OPERATION_FAILED => "operation failed",
            Self::WRONG_LENGTH => "wrong length",
            Self::COMMAND_NOT_ALLOWED => "command not allowed",
            Self::FUNCTION_NOT_SUPPORTED => "function not supported",
            Self::WRONG_P1_P2 => "wrong parameters (address out of range)",
            Self::INS_NOT_SUPPORTED => "instruction not supported",
            Self::CLA_NOT_SUPPORTED => "class not supported",
            _ if (sw & 0xFF00) == 0x6C00 => "wrong Le",
            _ => "unknown status",
        }
    }
}
