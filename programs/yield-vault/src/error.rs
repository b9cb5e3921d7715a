use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Deposit added no pool position")]
    ZeroValueDeposit,

    #[msg("Deposit too small to mint a single share")]
    DepositTooSmall,

    #[msg("Slippage tolerance exceeded")]
    SlippageExceeded,

    #[msg("Insufficient shares balance")]
    InsufficientShares,

    #[msg("Insufficient pool position in vault")]
    InsufficientPosition,

    #[msg("External collaborator call failed or returned an invalid value")]
    ExternalCallFailed,

    #[msg("Arithmetic overflow")]
    MathOverflow,

    #[msg("Division by zero")]
    DivisionByZero,

    #[msg("Unauthorized - caller is not vault authority")]
    Unauthorized,

    #[msg("Account does not match the collaborator bound to this vault")]
    InvalidCollaborator,
}
