//! Major declaration applications.

pub mod application;

pub use application::{
    ApplicationStatus, ApplicationStatusChange, MajorApplication, MajorApplicationDraft,
    SubmitMajorApplication, UNDECLARED,
};
