//! Grade change petitions.
//!
//! Instructors petition the registrar to change a student's recorded grade;
//! admins settle the petition. Pure domain logic, no IO.

pub mod petition;

pub use petition::{
    GradeChangePetition, PetitionDraft, PetitionStatus, PetitionStatusChange, SubmitPetition,
};
