//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for API boundaries and use case inputs/outputs.

mod receipts;

pub use receipts::{
    DepositReceipt, DepositRequest, ExecutionFailure, ExecutionReceipt, PriceUpdate,
    PriceUpdateReport, TierExecution, WithdrawRequest, WithdrawalReceipt,
};
