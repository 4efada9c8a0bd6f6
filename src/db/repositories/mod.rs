pub mod bill_image_repository;
pub mod expense_repository;
pub mod party_repository;
pub mod user_repository;

pub use bill_image_repository::BillImageRepository;
pub use expense_repository::{ExpenseRepository, ExpenseWithParticipants, NewExpense, NewParticipant};
pub use party_repository::PartyRepository;
pub use user_repository::UserRepository;
