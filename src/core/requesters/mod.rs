//! Module to provide the operations required
//! in order to retrieve a ticket from the KDC

mod exchange;
pub use exchange::{ExchangeConfig, KdcExchange, DEFAULT_MAX_ATTEMPTS};

mod receivers;
pub use receivers::{parse_kdc_rep, recv_ticket_cred, KdcRepParts, PVNO};

mod request_tgt;
pub use request_tgt::request_tgt;

mod request_tgs;
pub use request_tgs::request_tgs;
