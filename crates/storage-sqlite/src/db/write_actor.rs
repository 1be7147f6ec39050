use diesel::result::Error as DieselError;
use diesel::SqliteConnection;
use log::{debug, error};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;
use donmoa_core::errors::{DatabaseError, Error, Result};

// A job runs on the writer's connection and returns a core Result so callers
// keep their typed errors.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type ErasedValue = Box<dyn Any + Send + 'static>;
type Envelope = (Job<ErasedValue>, oneshot::Sender<Result<ErasedValue>>);

const WRITER_QUEUE_CAPACITY: usize = 1024;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Executes `job` on the writer actor's dedicated connection inside an
    /// immediate transaction. Any error returned by the job rolls the
    /// transaction back and is handed back unchanged.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as ErasedValue)),
                ret_tx,
            ))
            .await
            .map_err(|_| {
                Error::Database(DatabaseError::Internal(
                    "Writer actor is no longer running".to_string(),
                ))
            })?;

        let boxed = ret_rx.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer actor dropped the reply without a result".to_string(),
            ))
        })??;

        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::Unexpected("Failed to downcast writer actor result".to_string()))
    }
}

/// Spawns the single writer task. It owns one pooled connection and runs jobs
/// serially, each in its own immediate transaction.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(WRITER_QUEUE_CAPACITY);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer actor could not acquire a database connection: {}", e);
                let message = e.to_string();
                while let Some((_, reply_tx)) = rx.recv().await {
                    let _ = reply_tx.send(Err(Error::Database(
                        DatabaseError::ConnectionFailed(message.clone()),
                    )));
                }
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result = run_in_transaction(&mut conn, job);
            // The caller may have gone away; the work is committed either way.
            let _ = reply_tx.send(result);
        }
        debug!("Writer actor stopped: all handles dropped");
    });

    WriteHandle { tx }
}

fn run_in_transaction(conn: &mut SqliteConnection, job: Job<ErasedValue>) -> Result<ErasedValue> {
    let mut job_error: Option<Error> = None;

    let outcome = conn.immediate_transaction::<_, DieselError, _>(|c| {
        job(c).map_err(|err| {
            job_error = Some(err);
            DieselError::RollbackTransaction
        })
    });

    match outcome {
        Ok(value) => Ok(value),
        Err(diesel_err) => Err(match job_error {
            Some(err) => err,
            None => StorageError::from(diesel_err).into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations};
    use diesel::prelude::*;
    use diesel::sql_types::BigInt;
    use tempfile::tempdir;

    #[derive(QueryableByName)]
    struct Count {
        #[diesel(sql_type = BigInt)]
        n: i64,
    }

    fn account_count(pool: &DbPool) -> i64 {
        let mut conn = pool.get().unwrap();
        diesel::sql_query("SELECT COUNT(*) AS n FROM accounts")
            .get_result::<Count>(&mut conn)
            .unwrap()
            .n
    }

    #[tokio::test]
    async fn test_job_error_rolls_back_and_keeps_its_type() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("writer.db");
        let db_path = init(db_path.to_str().unwrap()).unwrap();
        let pool = create_pool(&db_path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer((*pool).clone());

        let result: Result<()> = writer
            .exec(|conn| {
                diesel::sql_query(
                    "INSERT INTO accounts (user_id, name) VALUES ('u1', 'Rolled back')",
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Err(Error::Conflict("stop".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::Conflict(ref m)) if m == "stop"));
        assert_eq!(account_count(&pool), 0);

        let inserted = writer
            .exec(|conn| {
                diesel::sql_query("INSERT INTO accounts (user_id, name) VALUES ('u1', 'Kept')")
                    .execute(conn)
                    .map_err(|e| Error::from(StorageError::from(e)))
            })
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(account_count(&pool), 1);
    }
}
