/// Escrow ledger state: owner identity, contributor balances and the
/// append-only funder log. Handlers validate first, the ledger mutates.
pub mod ledger;

/// Operation commands validated at the transport edge, later executed by
/// the [`processor`].
pub mod command;

/// Price oracle adapter: the narrow read interface the escrow consumes,
/// plus a deterministic fixed-rate implementation.
pub mod oracle;

/// Outbound native-value transport used by withdrawals, plus an
/// in-memory bank implementation.
pub mod transfer;

/// Escrow processor interface, plus "in memory" implementation.
/// Coordinates all the logic from command parsing and processing
///
/// NOTE: Technically this interface is not necessary, but it might be
/// good integration point to replace in memory implementation with
/// something more sophisticated.
pub mod processor;

/// Ideally, this module should exists on its own crate, as a way to
/// bootstrap core logic. However, I want to use it for integration test
/// so I put it here.
pub mod bin_utils;
