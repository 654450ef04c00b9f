// Exploration core: the path model, the state machine that drives it, and
// the session layer that runs its fetches against the career API.

pub mod controller;
pub mod debounce;
pub mod handlers;
pub mod path_state;
pub mod session;
