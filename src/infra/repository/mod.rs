//! Expense repository backends.

pub mod memory;

pub use memory::InMemoryExpenseRepository;
