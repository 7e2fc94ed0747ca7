// Entity Models - the parties that appear on a document
//
// Each entity has:
// - An *Info value (what the user typed into the form)
// - A stored record (Info + database id + created_at)
//
// Estimates reference these by id; the Info values are what get rendered.

pub mod bank_account;
pub mod client;
pub mod company;

pub use bank_account::{BankAccount, BankAccountInfo};
pub use client::{Client, ClientInfo, ClientKind};
pub use company::{Company, CompanyInfo};
