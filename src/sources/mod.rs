pub mod bse;
pub mod cookies;
pub mod nse;
pub mod tokens;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use bse::{BseDebtClient, SearchOutcome};
pub use cookies::SessionCookies;
pub use nse::NseBondClient;
pub use tokens::FormToken;
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
