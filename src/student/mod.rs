//! Students and their savings balances.

mod create;
mod db;
mod domain;

pub use create::{create_student_endpoint, get_new_student_modal};
pub use db::{
    create_student, create_student_table, get_student, list_students, load_students,
};
pub use domain::{Kelas, NewStudent, Student, StudentId, StudentName};
