pub mod claims;
pub mod expense;
pub mod party;
pub mod party_aggregate;
pub mod receipt;
pub mod user;

pub use claims::IdentityClaims;
pub use expense::{Expense, ExpenseParticipant};
pub use party::{BillImage, Party};
pub use party_aggregate::{
    BillImageSummary, Contributor, ExpenseAggregate, Participant, PartyAggregate, UserSummary,
};
pub use receipt::{ReceiptAnalysis, ReceiptItem};
pub use user::User;
