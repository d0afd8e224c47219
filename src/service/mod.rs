pub mod transaction_builder;

pub use transaction_builder::{
    BidNameRequest, BuyRamRequest, DelegateRequest, RegisterAccountRequest, SellRamRequest,
    TransactionBuilder, TransferRequest, UndelegateRequest, VoteRequest,
};
