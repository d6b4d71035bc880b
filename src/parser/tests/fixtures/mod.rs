// Test fixtures for parser testing
//
// C# sources modelled on typical Unity scripts. Each constant is a whole
// file so namespace, attribute and brace handling are exercised together.

pub mod mono_behaviours;
pub mod gameplay_systems;
pub mod edge_cases;

pub use mono_behaviours::*;
pub use gameplay_systems::*;
pub use edge_cases::*;
