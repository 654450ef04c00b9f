// Read-only catalog endpoints passed through from the career backend:
// popular universities, graph-wide and per-university statistics, the
// strongest career paths out of a university, and profile detail.

pub mod handlers;
