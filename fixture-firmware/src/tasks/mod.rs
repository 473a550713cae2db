// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig.
// Die HTTP-Tasks teilen sich die Leuchte über `&'static Fixture`.

pub mod http;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use http::http_server_task;
pub use wifi::{connection_task, dhcp_task, net_task};
