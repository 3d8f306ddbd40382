//! sea-orm models for the HR tables.

pub mod affectation_projet;
pub mod departement;
pub mod employee;
pub mod fiche_de_paie;
pub mod projet;
pub mod sessions;
