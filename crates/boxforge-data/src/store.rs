//! `SQLite`-backed record store.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Decode, Row, Sqlite, SqlitePool, Type};
use tracing::{debug, instrument};

use crate::error::{DataError, Result};
use crate::join::Joined;
use crate::records::{
    HandshakeJoin, HandshakeRow, InboundColumns, InboundJoinRow, InboundRow, ListenOptions, LogRow,
    NewHandshake, NewInbound, NewLog, NewReality, NewTls, NewTransport, NewUser, RealityJoin,
    RealityRow, TlsJoin, TlsRow, TransportJoin, TransportRow, UserRow,
};

const UPSERT_LOG: &str = r"
    INSERT INTO log (id, disabled, level, output, timestamp)
    VALUES (1, ?1, ?2, ?3, ?4)
    ON CONFLICT (id) DO UPDATE SET
        disabled = excluded.disabled,
        level = excluded.level,
        output = excluded.output,
        timestamp = excluded.timestamp
";

const SELECT_LOG: &str = r"SELECT disabled, level, output, timestamp FROM log WHERE id = 1";

const INSERT_USER: &str = r"INSERT INTO users (name, uuid, sub, active) VALUES (?1, ?2, ?3, ?4)";

const SELECT_USERS: &str = r"SELECT id, name, uuid, sub, active FROM users ORDER BY id ASC";

const SELECT_ACTIVE_USERS: &str = r"
    SELECT id, name, uuid, sub, active
    FROM users
    WHERE active = TRUE
    ORDER BY id ASC
";

const DELETE_USER: &str = r"DELETE FROM users WHERE id = ?1";

const UPDATE_USER_ACTIVE: &str = r"UPDATE users SET active = ?2 WHERE id = ?1";

const INSERT_TRANSPORT: &str = r"INSERT INTO transports (type, path) VALUES (?1, ?2)";

const SELECT_TRANSPORTS: &str = r"SELECT id, type, path FROM transports ORDER BY id ASC";

const DELETE_TRANSPORT: &str = r"DELETE FROM transports WHERE id = ?1";

const INSERT_TLS: &str = r"
    INSERT INTO tls (enabled, server_name, min_version, max_version, certificate_path, key_path)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";

const SELECT_TLS: &str = r"
    SELECT id, enabled, server_name, min_version, max_version, certificate_path, key_path
    FROM tls
    ORDER BY id ASC
";

const DELETE_TLS: &str = r"DELETE FROM tls WHERE id = ?1";

const INSERT_REALITY: &str =
    r"INSERT INTO reality (enabled, private_key, short_id) VALUES (?1, ?2, ?3)";

const SELECT_REALITY: &str =
    r"SELECT id, enabled, private_key, short_id FROM reality ORDER BY id ASC";

const DELETE_REALITY: &str = r"DELETE FROM reality WHERE id = ?1";

const INSERT_HANDSHAKE: &str = r"INSERT INTO handshake (server, server_port) VALUES (?1, ?2)";

const SELECT_HANDSHAKES: &str = r"SELECT id, server, server_port FROM handshake ORDER BY id ASC";

const DELETE_HANDSHAKE: &str = r"DELETE FROM handshake WHERE id = ?1";

const INSERT_INBOUND: &str = r"
    INSERT INTO inbounds (
        type, tag, listen, listen_port,
        tcp_fast_open, tcp_multi_path, udp_fragment, udp_timeout, detour,
        sniff, sniff_override_destination, sniff_timeout,
        domain_strategy, udp_disable_domain_unmapping,
        transport_id, tls_id, reality_id, handshake_id
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
";

const SELECT_INBOUNDS: &str = r"
    SELECT id, type, tag, listen, listen_port,
           sniff, sniff_override_destination, sniff_timeout, domain_strategy,
           transport_id, tls_id, reality_id, handshake_id
    FROM inbounds
    ORDER BY id ASC
";

const DELETE_INBOUND: &str = r"DELETE FROM inbounds WHERE id = ?1";

// Each sibling table is joined on its own reference; the `*_row_id` columns
// tell a joined row with null columns apart from no joined row.
const SELECT_INBOUND_JOINS: &str = r"
    SELECT
        i.id, i.type, i.tag, i.listen, i.listen_port,
        i.tcp_fast_open, i.tcp_multi_path, i.udp_fragment, i.udp_timeout, i.detour,
        i.sniff, i.sniff_override_destination, i.sniff_timeout,
        i.domain_strategy, i.udp_disable_domain_unmapping,
        t.id AS transport_row_id, t.type AS transport_type, t.path AS transport_path,
        tls.id AS tls_row_id, tls.enabled AS tls_enabled, tls.server_name AS tls_server_name,
        tls.min_version AS tls_min_version, tls.max_version AS tls_max_version,
        tls.certificate_path AS tls_certificate_path, tls.key_path AS tls_key_path,
        r.id AS reality_row_id, r.enabled AS reality_enabled,
        r.private_key AS reality_private_key, r.short_id AS reality_short_id,
        h.id AS handshake_row_id, h.server AS handshake_server,
        h.server_port AS handshake_server_port
    FROM inbounds i
    LEFT JOIN transports t ON i.transport_id = t.id
    LEFT JOIN tls ON i.tls_id = tls.id
    LEFT JOIN reality r ON i.reality_id = r.id
    LEFT JOIN handshake h ON i.handshake_id = h.id
    ORDER BY i.id ASC
";

const SCAN_INBOUND_JOINS: &str = "store.inbound_joins.scan";

fn map_query_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}

/// Database-backed repository for proxy configuration records.
#[derive(Clone, Debug)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (creating if missing) the database at `url` and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the database cannot be opened,
    /// or migrations fail.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(map_query_err("store.connect.options"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(map_query_err("store.connect"))?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when migration execution fails.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator
            .run(&pool)
            .await
            .map_err(|source| DataError::MigrationFailed { source })?;
        Ok(Self { pool })
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace the singleton log configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_log(&self, log: &NewLog) -> Result<()> {
        sqlx::query(UPSERT_LOG)
            .bind(log.disabled)
            .bind(&log.level)
            .bind(&log.output)
            .bind(log.timestamp)
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.log.upsert"))?;
        Ok(())
    }

    /// Load the singleton log configuration, if it has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded.
    pub async fn fetch_log(&self) -> Result<Option<LogRow>> {
        sqlx::query_as::<_, LogRow>(SELECT_LOG)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_query_err("store.log.fetch"))
    }

    /// Insert a user and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (for example a duplicate UUID or token).
    pub async fn insert_user(&self, user: &NewUser) -> Result<i64> {
        let result = sqlx::query(INSERT_USER)
            .bind(&user.name)
            .bind(&user.uuid)
            .bind(&user.sub)
            .bind(user.active)
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.users.insert"))?;
        Ok(result.last_insert_rowid())
    }

    /// List every user in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(SELECT_USERS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.users.list"))
    }

    /// List active users in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active_users(&self) -> Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(SELECT_ACTIVE_USERS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.users.list_active"))
    }

    /// Delete a user; returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_by_id(DELETE_USER, "store.users.delete", id).await
    }

    /// Set a user's active flag; returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn set_user_active(&self, id: i64, active: bool) -> Result<bool> {
        let result = sqlx::query(UPDATE_USER_ACTIVE)
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.users.set_active"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert a transport and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_transport(&self, transport: &NewTransport) -> Result<i64> {
        let result = sqlx::query(INSERT_TRANSPORT)
            .bind(&transport.kind)
            .bind(&transport.path)
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.transports.insert"))?;
        Ok(result.last_insert_rowid())
    }

    /// List transports.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_transports(&self) -> Result<Vec<TransportRow>> {
        sqlx::query_as::<_, TransportRow>(SELECT_TRANSPORTS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.transports.list"))
    }

    /// Delete a transport; returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn delete_transport(&self, id: i64) -> Result<bool> {
        self.delete_by_id(DELETE_TRANSPORT, "store.transports.delete", id).await
    }

    /// Insert a TLS configuration and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_tls(&self, tls: &NewTls) -> Result<i64> {
        let result = sqlx::query(INSERT_TLS)
            .bind(tls.enabled)
            .bind(tls.server_name.as_deref())
            .bind(tls.min_version.as_deref())
            .bind(tls.max_version.as_deref())
            .bind(tls.certificate_path.as_deref())
            .bind(tls.key_path.as_deref())
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.tls.insert"))?;
        Ok(result.last_insert_rowid())
    }

    /// List TLS configurations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_tls(&self) -> Result<Vec<TlsRow>> {
        sqlx::query_as::<_, TlsRow>(SELECT_TLS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.tls.list"))
    }

    /// Delete a TLS configuration; returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn delete_tls(&self, id: i64) -> Result<bool> {
        self.delete_by_id(DELETE_TLS, "store.tls.delete", id).await
    }

    /// Insert a reality configuration and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_reality(&self, reality: &NewReality) -> Result<i64> {
        let result = sqlx::query(INSERT_REALITY)
            .bind(reality.enabled)
            .bind(reality.private_key.as_deref())
            .bind(reality.short_id.as_deref())
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.reality.insert"))?;
        Ok(result.last_insert_rowid())
    }

    /// List reality configurations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_reality(&self) -> Result<Vec<RealityRow>> {
        sqlx::query_as::<_, RealityRow>(SELECT_REALITY)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.reality.list"))
    }

    /// Delete a reality configuration; returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn delete_reality(&self, id: i64) -> Result<bool> {
        self.delete_by_id(DELETE_REALITY, "store.reality.delete", id).await
    }

    /// Insert a handshake configuration and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_handshake(&self, handshake: &NewHandshake) -> Result<i64> {
        let result = sqlx::query(INSERT_HANDSHAKE)
            .bind(handshake.server.as_deref())
            .bind(handshake.server_port.map(i64::from))
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.handshake.insert"))?;
        Ok(result.last_insert_rowid())
    }

    /// List handshake configurations.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_handshakes(&self) -> Result<Vec<HandshakeRow>> {
        sqlx::query_as::<_, HandshakeRow>(SELECT_HANDSHAKES)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.handshake.list"))
    }

    /// Delete a handshake configuration; returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn delete_handshake(&self, id: i64) -> Result<bool> {
        self.delete_by_id(DELETE_HANDSHAKE, "store.handshake.delete", id).await
    }

    /// Insert an inbound and return its id.
    ///
    /// References are stored as given; they are not checked against the
    /// referenced tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (for example a duplicate tag).
    pub async fn insert_inbound(&self, inbound: &NewInbound) -> Result<i64> {
        let options = &inbound.listen_options;
        let result = sqlx::query(INSERT_INBOUND)
            .bind(&inbound.kind)
            .bind(&inbound.tag)
            .bind(&inbound.listen)
            .bind(i64::from(inbound.listen_port))
            .bind(options.tcp_fast_open)
            .bind(options.tcp_multi_path)
            .bind(options.udp_fragment)
            .bind(options.udp_timeout.as_deref())
            .bind(options.detour.as_deref())
            .bind(inbound.sniff)
            .bind(inbound.sniff_override_destination)
            .bind(&inbound.sniff_timeout)
            .bind(inbound.domain_strategy.as_deref())
            .bind(options.udp_disable_domain_unmapping)
            .bind(inbound.transport_id)
            .bind(inbound.tls_id)
            .bind(inbound.reality_id)
            .bind(inbound.handshake_id)
            .execute(&self.pool)
            .await
            .map_err(map_query_err("store.inbounds.insert"))?;
        Ok(result.last_insert_rowid())
    }

    /// List inbounds with their raw reference ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_inbounds(&self) -> Result<Vec<InboundRow>> {
        sqlx::query_as::<_, InboundRow>(SELECT_INBOUNDS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.inbounds.list"))
    }

    /// Delete an inbound; returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn delete_inbound(&self, id: i64) -> Result<bool> {
        self.delete_by_id(DELETE_INBOUND, "store.inbounds.delete", id).await
    }

    /// Load every inbound joined against its optional transport, TLS,
    /// reality, and handshake rows, in ascending inbound id order.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::QueryFailed`] when the query fails and
    /// [`DataError::RowDecode`] or [`DataError::ColumnOutOfRange`] when any
    /// row has an unexpected shape; no partial result is returned.
    #[instrument(skip(self))]
    pub async fn fetch_inbound_join_rows(&self) -> Result<Vec<InboundJoinRow>> {
        let rows = sqlx::query(SELECT_INBOUND_JOINS)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("store.inbound_joins.fetch"))?;
        debug!(rows = rows.len(), "fetched inbound join rows");
        rows.iter().map(scan_inbound_join_row).collect()
    }

    async fn delete_by_id(
        &self,
        statement: &'static str,
        operation: &'static str,
        id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(statement)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_query_err(operation))?;
        Ok(result.rows_affected() > 0)
    }
}

fn column<'r, T>(row: &'r SqliteRow, column: &'static str) -> Result<T>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(column).map_err(|source| DataError::RowDecode {
        operation: SCAN_INBOUND_JOINS,
        column,
        source,
    })
}

fn joined<'r, T>(row: &'r SqliteRow, row_joined: bool, name: &'static str) -> Result<Joined<T>>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    let value = column::<Option<T>>(row, name)?;
    Ok(Joined::from_column(row_joined, value))
}

fn port(column: &'static str, value: i64) -> Result<u16> {
    u16::try_from(value).map_err(|_| DataError::ColumnOutOfRange { column, value })
}

fn row_joined(row: &SqliteRow, key: &'static str) -> Result<bool> {
    Ok(column::<Option<i64>>(row, key)?.is_some())
}

fn scan_inbound_join_row(row: &SqliteRow) -> Result<InboundJoinRow> {
    let inbound = InboundColumns {
        id: column(row, "id")?,
        kind: column(row, "type")?,
        tag: column(row, "tag")?,
        listen: column(row, "listen")?,
        listen_port: port("listen_port", column(row, "listen_port")?)?,
        sniff: column(row, "sniff")?,
        sniff_override_destination: column(row, "sniff_override_destination")?,
        sniff_timeout: column(row, "sniff_timeout")?,
        domain_strategy: column(row, "domain_strategy")?,
        listen_options: ListenOptions {
            tcp_fast_open: column(row, "tcp_fast_open")?,
            tcp_multi_path: column(row, "tcp_multi_path")?,
            udp_fragment: column(row, "udp_fragment")?,
            udp_timeout: column(row, "udp_timeout")?,
            detour: column(row, "detour")?,
            udp_disable_domain_unmapping: column(row, "udp_disable_domain_unmapping")?,
        },
    };

    let has_transport = row_joined(row, "transport_row_id")?;
    let transport = TransportJoin {
        kind: joined(row, has_transport, "transport_type")?,
        path: joined(row, has_transport, "transport_path")?,
    };

    let has_tls = row_joined(row, "tls_row_id")?;
    let tls = TlsJoin {
        enabled: joined(row, has_tls, "tls_enabled")?,
        server_name: joined(row, has_tls, "tls_server_name")?,
        min_version: joined(row, has_tls, "tls_min_version")?,
        max_version: joined(row, has_tls, "tls_max_version")?,
        certificate_path: joined(row, has_tls, "tls_certificate_path")?,
        key_path: joined(row, has_tls, "tls_key_path")?,
    };

    let has_reality = row_joined(row, "reality_row_id")?;
    let reality = RealityJoin {
        enabled: joined(row, has_reality, "reality_enabled")?,
        private_key: joined(row, has_reality, "reality_private_key")?,
        short_id: joined(row, has_reality, "reality_short_id")?,
    };

    let has_handshake = row_joined(row, "handshake_row_id")?;
    let server_port = match joined::<i64>(row, has_handshake, "handshake_server_port")? {
        Joined::Value(value) => Joined::Value(port("handshake_server_port", value)?),
        Joined::Null => Joined::Null,
        Joined::Unjoined => Joined::Unjoined,
    };
    let handshake = HandshakeJoin {
        server: joined(row, has_handshake, "handshake_server")?,
        server_port,
    };

    Ok(InboundJoinRow {
        inbound,
        transport,
        tls,
        reality,
        handshake,
    })
}
