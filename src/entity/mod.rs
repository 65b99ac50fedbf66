//! SeaORM entity definitions.
//!
//! Relations are declared for navigation only. Every foreign key is created
//! `ON DELETE RESTRICT`; removal order is owned by the cascade deletion code.

pub mod defect;
pub mod execution;
pub mod execution_step;
pub mod test_case;
pub mod test_cycle;
pub mod test_step;
