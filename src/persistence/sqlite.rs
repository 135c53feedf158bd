use {
    crate::{
        models::{Account, AccountId, NewAccount},
        persistence::{AccountStore, StoreError, StoreSession},
    },
    rusqlite::{Connection, OptionalExtension, params},
    rust_decimal::Decimal,
    std::{
        path::{Path, PathBuf},
        str::FromStr,
        time::Duration,
    },
    tracing::{info, warn},
};

/// SQLite-backed store. Every session gets its own connection.
pub struct SqliteStore {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    pub fn new(db_path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StoreError> {
        let store = SqliteStore {
            db_path: db_path.as_ref().to_path_buf(),
            busy_timeout,
        };
        store.init_db()?;
        info!("Using SQLite database at {}", store.db_path.display());
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        // WAL keeps readers off the writers' backs; returns the new mode as a row.
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                holder_name TEXT NOT NULL,
                balance TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl AccountStore for SqliteStore {
    type Session<'a> = SqliteSession;

    fn begin(&self) -> Result<Self::Session<'_>, StoreError> {
        let conn = self.connect()?;
        // IMMEDIATE takes the write lock up front so two read-then-write
        // sessions never have to upgrade against each other.
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(SqliteSession {
            conn,
            finished: false,
        })
    }
}

pub struct SqliteSession {
    conn: Connection,
    finished: bool,
}

fn decode_row(
    id: AccountId,
    holder_name: String,
    balance: String,
) -> Result<Account, StoreError> {
    let balance = Decimal::from_str(&balance)
        .map_err(|_| StoreError::CorruptBalance { id, value: balance })?;

    Ok(Account {
        id,
        holder_name,
        balance,
    })
}

impl StoreSession for SqliteSession {
    fn get(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, holder_name, balance FROM accounts WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(id, holder_name, balance)| decode_row(id, holder_name, balance))
            .transpose()
    }

    fn insert(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        let balance = account.balance.to_string();

        let id = match account.id {
            Some(id) => {
                self.conn.execute(
                    "INSERT INTO accounts (id, holder_name, balance) VALUES (?1, ?2, ?3)",
                    params![id, account.holder_name, balance],
                )?;
                id
            }
            None => {
                self.conn.execute(
                    "INSERT INTO accounts (holder_name, balance) VALUES (?1, ?2)",
                    params![account.holder_name, balance],
                )?;
                self.conn.last_insert_rowid()
            }
        };

        Ok(account.into_account(id))
    }

    fn save(&mut self, account: &Account) -> Result<Account, StoreError> {
        self.conn.execute(
            "INSERT INTO accounts (id, holder_name, balance) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                holder_name = excluded.holder_name,
                balance = excluded.balance",
            params![account.id, account.holder_name, account.balance.to_string()],
        )?;
        Ok(account.clone())
    }

    fn exists(&mut self, id: AccountId) -> Result<bool, StoreError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn delete(&mut self, id: AccountId) -> Result<(), StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;

        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn list(&mut self) -> Result<Vec<Account>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, holder_name, balance FROM accounts ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, AccountId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            let (id, holder_name, balance) = row?;
            accounts.push(decode_row(id, holder_name, balance)?);
        }

        Ok(accounts)
    }

    fn commit(mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!("Failed to roll back SQLite session: {}", e);
        }
    }
}
