//! Domain models for the MediDiagnose client.

mod analysis;
mod diagnosis;
mod history;
mod session;
mod symptom;

pub use analysis::*;
pub use diagnosis::*;
pub use history::*;
pub use session::*;
pub use symptom::*;
