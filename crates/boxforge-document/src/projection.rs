//! Relational rows to nested document.
//!
//! Reality and Handshake live in sibling tables joined independently of TLS,
//! yet the document nests Reality inside TLS and Handshake inside Reality.
//! [`assemble_inbound`] performs that reconstruction for one flat row without
//! touching the store; [`project`] feeds it.

use async_trait::async_trait;
use boxforge_data::{
    DataResult, HandshakeJoin, InboundJoinRow, LogRow, RealityJoin, RecordStore, TlsJoin,
    TransportJoin, UserRow,
};
use tracing::{debug, instrument, warn};

use crate::error::ProjectionError;
use crate::model::{Document, DocumentUser, Handshake, Inbound, Log, Reality, Tls, Transport};

/// Read-only access to the records a projection needs.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// The singleton log settings, if stored.
    async fn log_settings(&self) -> DataResult<Option<LogRow>>;

    /// Every user in insertion order, active or not.
    async fn users(&self) -> DataResult<Vec<UserRow>>;

    /// One flat row per inbound, ascending by id.
    async fn inbound_rows(&self) -> DataResult<Vec<InboundJoinRow>>;
}

#[async_trait]
impl RecordSource for RecordStore {
    async fn log_settings(&self) -> DataResult<Option<LogRow>> {
        self.fetch_log().await
    }

    async fn users(&self) -> DataResult<Vec<UserRow>> {
        self.list_users().await
    }

    async fn inbound_rows(&self) -> DataResult<Vec<InboundJoinRow>> {
        self.fetch_inbound_join_rows().await
    }
}

/// Knobs that change the projected shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Attach each user's subscription token to inbound user entries.
    pub include_user_sub: bool,
}

/// A nested block that was joined while its parent was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanedBlock {
    /// Reality joined without a TLS row.
    RealityWithoutTls,
    /// Handshake joined without a Reality row.
    HandshakeWithoutReality,
}

impl OrphanedBlock {
    /// Short label used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RealityWithoutTls => "reality_without_tls",
            Self::HandshakeWithoutReality => "handshake_without_reality",
        }
    }
}

/// Build the whole document from `source`.
///
/// Any read or scan failure aborts the projection; a partial document is
/// never returned.
///
/// # Errors
///
/// Returns [`ProjectionError::MissingSingleton`] when no log row exists and
/// [`ProjectionError::Scan`] or [`ProjectionError::Store`] when the records
/// cannot be read.
#[instrument(skip_all, fields(include_user_sub = options.include_user_sub))]
pub async fn project<S>(source: &S, options: ProjectionOptions) -> Result<Document, ProjectionError>
where
    S: RecordSource + ?Sized,
{
    let log = source
        .log_settings()
        .await
        .map_err(|err| ProjectionError::from_store("projection.log", err))?
        .ok_or(ProjectionError::MissingSingleton { table: "log" })?;

    let users = source
        .users()
        .await
        .map_err(|err| ProjectionError::from_store("projection.users", err))?;
    let users = document_users(&users, options);

    let rows = source
        .inbound_rows()
        .await
        .map_err(|err| ProjectionError::from_store("projection.inbounds", err))?;

    let mut inbounds = Vec::with_capacity(rows.len());
    for row in &rows {
        for orphan in orphaned_blocks(row) {
            warn!(
                inbound = %row.inbound.tag,
                block = orphan.as_str(),
                "rendering orphaned block under a disabled parent"
            );
        }
        inbounds.push(assemble_inbound(row, &users));
    }
    debug!(inbounds = inbounds.len(), users = users.len(), "projected document");

    Ok(Document {
        log: assemble_log(log),
        inbounds,
        ..Document::default()
    })
}

/// Active users in insertion order, shaped for inbound user lists.
#[must_use]
pub fn document_users(users: &[UserRow], options: ProjectionOptions) -> Vec<DocumentUser> {
    users
        .iter()
        .filter(|user| user.active)
        .map(|user| DocumentUser {
            name: user.name.clone(),
            uuid: user.uuid.clone(),
            sub: options.include_user_sub.then(|| user.sub.clone()),
        })
        .collect()
}

/// Nest one flat projection row into an inbound node.
#[must_use]
pub fn assemble_inbound(row: &InboundJoinRow, users: &[DocumentUser]) -> Inbound {
    let columns = &row.inbound;
    let listen = &columns.listen_options;
    Inbound {
        kind: columns.kind.clone(),
        tag: columns.tag.clone(),
        listen: columns.listen.clone(),
        listen_port: columns.listen_port,
        tcp_fast_open: listen.tcp_fast_open,
        tcp_multi_path: listen.tcp_multi_path,
        udp_fragment: listen.udp_fragment,
        udp_timeout: listen.udp_timeout.clone(),
        detour: listen.detour.clone(),
        sniff: columns.sniff,
        sniff_override_destination: columns.sniff_override_destination,
        sniff_timeout: columns.sniff_timeout.clone(),
        domain_strategy: columns.domain_strategy.clone(),
        udp_disable_domain_unmapping: listen.udp_disable_domain_unmapping,
        users: users.to_vec(),
        tls: assemble_tls(&row.tls, &row.reality, &row.handshake),
        transport: assemble_transport(&row.transport),
    }
}

/// Blocks in `row` whose parent block was not joined.
#[must_use]
pub fn orphaned_blocks(row: &InboundJoinRow) -> Vec<OrphanedBlock> {
    let tls_joined = row.tls.enabled.is_joined();
    let reality_joined = row.reality.enabled.is_joined();
    let handshake_joined = row.handshake.server.is_joined();

    let mut orphans = Vec::new();
    if reality_joined && !tls_joined {
        orphans.push(OrphanedBlock::RealityWithoutTls);
    }
    if handshake_joined && !reality_joined {
        orphans.push(OrphanedBlock::HandshakeWithoutReality);
    }
    orphans
}

fn assemble_log(row: LogRow) -> Log {
    Log {
        disabled: row.disabled,
        level: row.level,
        output: row.output,
        timestamp: row.timestamp,
    }
}

fn assemble_tls(tls: &TlsJoin, reality: &RealityJoin, handshake: &HandshakeJoin) -> Tls {
    Tls {
        enabled: tls.enabled.is_true(),
        server_name: tls.server_name.clone().into_option(),
        min_version: tls.min_version.clone().into_option(),
        max_version: tls.max_version.clone().into_option(),
        certificate_path: tls.certificate_path.clone().into_option(),
        key_path: tls.key_path.clone().into_option(),
        reality: Reality {
            enabled: reality.enabled.is_true(),
            handshake: Handshake {
                server: handshake.server.clone().into_option(),
                server_port: handshake.server_port.clone().into_option(),
            },
            private_key: reality.private_key.clone().into_option(),
            short_id: reality.short_id.clone().into_option(),
        },
    }
}

fn assemble_transport(transport: &TransportJoin) -> Transport {
    Transport {
        kind: transport.kind.clone().into_option(),
        path: transport.path.clone().into_option(),
    }
}
