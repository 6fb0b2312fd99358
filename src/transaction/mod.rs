//! Deposits (setor) and withdrawals (tarik) from students' savings.
//!
//! Every change to a balance goes through [process_transaction], which
//! records an immutable [Transaction] alongside the new balance.

mod domain;
mod form;
mod processor;

pub use domain::{Transaction, TransactionId, TransactionKind, TransactionRequest};
pub use form::{create_transaction_endpoint, get_transaction_modal};
pub use processor::{
    ProcessedTransaction, create_transaction_table, list_student_transactions, process_transaction,
};
