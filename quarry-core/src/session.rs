use crate::{
    AsValue, Binder, ColumnDescriptor, ConcurrencyMode, Config, Connection, Driver, Entity,
    Error, ErrorKind, Executor, IsolationLevel, Preload, Property, PropertyExpression, Query,
    QueryExpression, Result, RowLabeled, RowsAffected, SqlWriter, StorageCommand,
    TableDescriptor, TransactionToken, TransactionType, Value,
    cache::{CacheKey, ResultCache},
    checksum, parallel_for, parse_connection_url,
    stream::{self, Stream, StreamExt, TryStreamExt},
    transaction::AmbientTransaction,
};
use futures::future::{self, Either};
use std::{pin::pin, sync::Arc};

/// Storage provider: executes the compiled commands over one connection and turns the
/// results into entities.
///
/// The session owns the ambient transaction and the result cache, every operation is awaited
/// by the caller before the next one starts.
pub struct Session<X: Executor> {
    executor: X,
    writer: Box<dyn SqlWriter>,
    config: Config,
    transaction: AmbientTransaction,
    cache: ResultCache,
}

fn storage_error(command: &str, dialect: &'static str, source: Error) -> Error {
    let error = ErrorKind::StorageProvider {
        command: command.to_string(),
        dialect,
        source,
    };
    log::error!("{:#}", error);
    error.into()
}

fn require(table: &TableDescriptor, allowed: bool, operation: TransactionType) -> Result<()> {
    if allowed {
        return Ok(());
    }
    Err(ErrorKind::InvalidOperation(format!(
        "Table `{}` does not allow {}",
        table.full_name(),
        operation
    ))
    .into())
}

fn validate<E: Entity>(entity: &E) -> Result<()> {
    entity.validate().map_err(|e| {
        ErrorKind::Validation {
            type_name: E::describe()
                .map(|t| t.type_name)
                .unwrap_or(std::any::type_name::<E>()),
            message: format!("{e:#}"),
        }
        .into()
    })
}

/// `id = value` for every identifier column, combined with `AND`.
fn identity_condition(table: &TableDescriptor, row: &[Value]) -> Result<PropertyExpression> {
    let mut condition = PropertyExpression::Empty;
    for (column, value) in table.columns.iter().zip(row) {
        if column.identifier {
            condition = condition.and(column.column_ref.equal(PropertyExpression::literal(
                value.clone(),
            )));
        }
    }
    if condition.is_empty() {
        return Err(ErrorKind::InvalidOperation(format!(
            "Table `{}` has no identifier column",
            table.full_name()
        ))
        .into());
    }
    Ok(condition)
}

/// Condition matching any of the rows, `IN` for single column identifiers.
fn identities_condition(table: &TableDescriptor, rows: &[Vec<Value>]) -> Result<PropertyExpression> {
    let identifiers: Vec<_> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.identifier)
        .collect();
    match identifiers.as_slice() {
        [] => identity_condition(table, &[]),
        [(i, column)] => Ok(column.column_ref.is_in(
            rows.iter()
                .map(|row| PropertyExpression::literal(row[*i].clone())),
        )),
        _ => rows.iter().try_fold(PropertyExpression::Empty, |acc, row| {
            Ok(acc.or(identity_condition(table, row)?))
        }),
    }
}

fn labels(table: &TableDescriptor) -> Arc<[String]> {
    table.columns.iter().map(|c| c.name().to_string()).collect()
}

impl<X: Executor> Session<X> {
    /// Session compiling with the writer of the driver.
    pub fn new(executor: X) -> Self {
        let writer = Box::new(executor.driver().sql_writer());
        Self::with_writer(executor, writer)
    }

    pub fn with_writer(executor: X, writer: Box<dyn SqlWriter>) -> Self {
        Self {
            executor,
            writer,
            config: Config::default(),
            transaction: AmbientTransaction::default(),
            cache: ResultCache::default(),
        }
    }

    /// Opens a connection and reads the session settings from the query of the same url.
    pub async fn connect(url: &str) -> Result<Self>
    where
        X: Connection,
    {
        let parsed = parse_connection_url(url, <X::Driver as Driver>::NAME)?;
        let config = Config::from_url(&parsed)?;
        let executor = X::connect(url).await?;
        log::debug!("Connected to `{url}`");
        Ok(Self::new(executor).with_config(config))
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn writer(&self) -> &dyn SqlWriter {
        self.writer.as_ref()
    }

    pub fn executor(&mut self) -> &mut X {
        &mut self.executor
    }

    pub fn into_executor(self) -> X {
        self.executor
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_active()
    }

    /// Compiles with the session writer, applying the configured timeout.
    pub fn compile(&self, query: &Query) -> Result<StorageCommand> {
        Ok(self
            .writer
            .compile(query)?
            .with_timeout(self.config.command_timeout))
    }

    /// Runs a command that does not return rows. A write drops every cached result, the
    /// command text does not say reliably which tables it touches.
    pub async fn execute(&mut self, command: StorageCommand) -> Result<RowsAffected> {
        let write = command.transaction_type().is_some_and(|v| v.is_write());
        let result = self.run(command).await?;
        if write {
            self.cache.clear();
        }
        Ok(result)
    }

    async fn run(&mut self, mut command: StorageCommand) -> Result<RowsAffected> {
        if command.timeout.is_none() {
            command.timeout = self.config.command_timeout;
        }
        log::debug!("{}", command);
        let text = command.text.clone();
        let dialect = self.writer.dialect();
        self.executor
            .execute(command)
            .await
            .map_err(|e| storage_error(&text, dialect, e))
    }

    /// Runs a command and collects its rows.
    pub async fn fetch(&mut self, mut command: StorageCommand) -> Result<Vec<RowLabeled>> {
        if command.timeout.is_none() {
            command.timeout = self.config.command_timeout;
        }
        log::debug!("{}", command);
        let text = command.text.clone();
        let dialect = self.writer.dialect();
        self.executor
            .fetch(command)
            .map_err(|e| storage_error(&text, dialect, e))
            .try_collect()
            .await
    }

    async fn fetch_cached(
        &mut self,
        table: &TableDescriptor,
        query: &Query,
        command: StorageCommand,
    ) -> Result<Vec<RowLabeled>> {
        let Some(policy) = table.cache.filter(|v| v.enabled) else {
            return self.fetch(command).await;
        };
        let key = CacheKey::new(query.tables(), &command);
        if let Some(rows) = self.cache.get(&key) {
            log::debug!("Cached result for {}", command);
            return Ok(rows);
        }
        let rows = self.fetch(command).await?;
        self.cache.insert(key, rows.clone(), policy.timeout);
        Ok(rows)
    }

    /// Lazy single pass stream of entities, relations are not loaded.
    pub fn stream<E: Entity>(&mut self, query: &Query) -> impl Stream<Item = Result<E>> + Send {
        let command = match self.compile(query) {
            Ok(command) => command,
            Err(error) => return Either::Right(stream::once(future::ready(Err(error)))),
        };
        log::debug!("{}", command);
        let text = command.text.clone();
        let dialect = self.writer.dialect();
        Either::Left(Binder::bind(
            self.executor
                .fetch(command)
                .map_err(move |e| storage_error(&text, dialect, e)),
        ))
    }

    pub async fn select<E: Entity>(&mut self, query: &Query) -> Result<Vec<E>> {
        self.select_with(query, &Preload::default()).await
    }

    /// Selects and loads the relations named by `preload` (one query per relation per object).
    pub async fn select_with<E: Entity>(
        &mut self,
        query: &Query,
        preload: &Preload,
    ) -> Result<Vec<E>> {
        let table = query.source()?.clone();
        require(&table, table.capabilities.select, TransactionType::Select)?;
        let command = self.compile(query)?;
        let rows = self.fetch_cached(&table, query, command).await?;
        let mut entities = rows
            .into_iter()
            .map(Binder::bind_row)
            .collect::<Result<Vec<E>>>()?;
        if !preload.is_empty() {
            for entity in entities.iter_mut() {
                entity.load_relations(self, preload).await?;
            }
        }
        Ok(entities)
    }

    /// Object with the given identifier, for types with a single identifier column.
    pub async fn find<E: Entity>(&mut self, id: impl AsValue) -> Result<Option<E>> {
        let table = E::describe()?;
        let mut identifiers = table.identifiers();
        let (Some(column), None) = (identifiers.next(), identifiers.next()) else {
            return Err(ErrorKind::InvalidOperation(format!(
                "`find` requires exactly one identifier column in `{}`",
                table.full_name()
            ))
            .into());
        };
        let condition = column
            .column_ref
            .equal(PropertyExpression::literal(id.as_value()));
        let query = QueryExpression::new()
            .from_table(table.clone())
            .filter(condition)
            .build()?;
        Ok(self.select::<E>(&query).await?.into_iter().next())
    }

    async fn stored_row<E: Entity>(
        &mut self,
        table: &Arc<TableDescriptor>,
        entity: &E,
    ) -> Result<Option<RowLabeled>> {
        let query = QueryExpression::new()
            .from_table(table.clone())
            .filter(identity_condition(table, &entity.row())?)
            .build()?;
        let command = self.compile(&query)?;
        Ok(self.fetch(command).await?.into_iter().next())
    }

    /// Reads again the stored row of the object.
    pub async fn reload<E: Entity>(&mut self, entity: &E) -> Result<Option<E>> {
        let table = E::describe()?;
        self.stored_row(&table, entity)
            .await?
            .map(Binder::bind_row)
            .transpose()
    }

    pub async fn exists<E: Entity>(&mut self, entity: &E) -> Result<bool> {
        let table = E::describe()?;
        let condition = identity_condition(&table, &entity.row())?;
        Ok(self.count::<E>(condition).await? > 0)
    }

    /// Number of rows matching `condition`, an empty condition counts the whole table.
    pub async fn count<E: Entity>(&mut self, condition: impl Into<PropertyExpression>) -> Result<u64> {
        let table = E::describe()?;
        let query = QueryExpression::new()
            .select([PropertyExpression::count_all().alias("__count")])
            .from_table(table)
            .filter(condition)
            .build()?;
        let command = self.compile(&query)?;
        let row = self.fetch(command).await?.into_iter().next();
        match row.and_then(|mut v| v.take_column("__count")) {
            Some(value) => u64::try_from_value(value),
            None => Ok(0),
        }
    }

    /// Copies the storage generated columns of the stored row into the object.
    async fn merge_generated<E: Entity>(
        &mut self,
        table: &Arc<TableDescriptor>,
        entity: &mut E,
        filter: impl Fn(&ColumnDescriptor) -> bool,
    ) -> Result<()> {
        if !table.columns.iter().any(&filter) {
            return Ok(());
        }
        let Some(mut row) = self.stored_row(table, entity).await? else {
            return Ok(());
        };
        for column in table.columns.iter().filter(|&c| filter(c)) {
            if let Some(value) = row.take_column(column.name()) {
                entity.set_column(column.name(), value)?;
            }
        }
        Ok(())
    }

    fn refresh_checksum<E: Entity>(entity: &mut E) -> Result<()> {
        if E::TRACKS_CHECKSUM {
            let checksum = checksum(entity)?;
            entity.set_checksum(Some(checksum));
        }
        Ok(())
    }

    /// Inserts the object, then merges back the generated key and the computed columns.
    pub async fn insert<E: Entity>(&mut self, entity: &mut E) -> Result<RowsAffected> {
        validate(entity)?;
        let table = E::describe()?;
        require(&table, table.capabilities.insert, TransactionType::Insert)?;
        let row = entity.row();
        let values = table
            .columns
            .iter()
            .zip(row)
            .filter(|(c, v)| c.insertable() && !(c.has_default && v.is_null()))
            .map(|(c, v)| (c.column_ref, PropertyExpression::literal(v)));
        let query = QueryExpression::statement_on(TransactionType::Insert, table.clone())
            .values(values)
            .build()?;
        let command = self.compile(&query)?;
        let result = self.run(command).await?;
        if let Some(id) = result.last_affected_id
            && let Some(column) = table.identifiers().find(|c| c.auto_increment)
        {
            entity.set_column(column.name(), Value::Int64(Some(id)))?;
        }
        self.merge_generated(&table, entity, |c| {
            (c.computed || c.has_default) && !c.auto_increment
        })
        .await?;
        Self::refresh_checksum(entity)?;
        self.cache.invalidate(table.name);
        Ok(result)
    }

    /// Updates the stored row of the object.
    ///
    /// When the object carries a checksum the stored row is compared first, a mismatch fails
    /// with [`ErrorKind::Concurrency`] unless the session ignores conflicts.
    pub async fn update<E: Entity>(&mut self, entity: &mut E) -> Result<RowsAffected> {
        validate(entity)?;
        let table = E::describe()?;
        require(&table, table.capabilities.update, TransactionType::Update)?;
        if let Some(expected) = entity.checksum().filter(|_| E::TRACKS_CHECKSUM) {
            let stored = match self.stored_row(&table, entity).await? {
                Some(row) => Some(checksum(&E::from_row(row)?)?),
                None => None,
            };
            if stored != Some(expected) {
                match self.config.concurrency {
                    ConcurrencyMode::Fail => {
                        return Err(ErrorKind::Concurrency {
                            type_name: table.type_name,
                            stale: RowLabeled::new(labels(&table), entity.row().into()),
                        }
                        .into());
                    }
                    ConcurrencyMode::Ignore => log::warn!(
                        "The stored `{}` row changed after it was loaded, overwriting it",
                        table.type_name
                    ),
                }
            }
        }
        let row = entity.row();
        let condition = identity_condition(&table, &row)?;
        let mut builder = QueryExpression::statement_on(TransactionType::Update, table.clone());
        for (column, value) in table.columns.iter().zip(row) {
            if column.updatable() {
                builder = builder.set(column.column_ref, PropertyExpression::literal(value));
            }
        }
        let query = builder.filter(condition).build()?;
        let command = self.compile(&query)?;
        let result = self.run(command).await?;
        if result.rows_affected == 0 {
            log::warn!("The update of `{}` did not match any row", table.type_name);
        }
        self.merge_generated(&table, entity, |c| c.computed).await?;
        Self::refresh_checksum(entity)?;
        self.cache.invalidate(table.name);
        Ok(result)
    }

    pub async fn delete<E: Entity>(&mut self, entity: &E) -> Result<RowsAffected> {
        let table = E::describe()?;
        require(&table, table.capabilities.delete, TransactionType::Delete)?;
        let query = QueryExpression::statement_on(TransactionType::Delete, table.clone())
            .filter(identity_condition(&table, &entity.row())?)
            .build()?;
        let command = self.compile(&query)?;
        let result = self.run(command).await?;
        self.cache.invalidate(table.name);
        Ok(result)
    }

    /// Deletes every row of the table.
    pub async fn truncate<E: Entity>(&mut self) -> Result<RowsAffected> {
        let table = E::describe()?;
        require(&table, table.capabilities.truncate, TransactionType::Truncate)?;
        let query = QueryExpression::truncate::<E>().build()?;
        let command = self.compile(&query)?;
        let result = self.run(command).await?;
        self.cache.invalidate(table.name);
        Ok(result)
    }

    /// Compiles one command list per chunk of `batch_size` objects.
    fn compile_chunks<E, F>(&self, entities: &[E], compile: F) -> Result<Vec<Vec<StorageCommand>>>
    where
        E: Entity,
        F: Fn(&dyn SqlWriter, &[E]) -> Result<Vec<StorageCommand>> + Sync,
    {
        let writer = self.writer.as_ref();
        let timeout = self.config.command_timeout;
        let compile_chunk = |chunk: &[E]| -> Result<Vec<StorageCommand>> {
            Ok(compile(writer, chunk)?
                .into_iter()
                .map(|v| v.with_timeout(timeout))
                .collect())
        };
        if self.config.parallel_compile {
            parallel_for(entities, self.config.batch_size, compile_chunk)
        } else {
            entities
                .chunks(self.config.batch_size.max(1))
                .map(compile_chunk)
                .collect()
        }
    }

    async fn execute_chunks(&mut self, chunks: Vec<Vec<StorageCommand>>) -> Result<RowsAffected> {
        let mut total = RowsAffected::default();
        for commands in chunks {
            for command in commands {
                total.extend([self.run(command).await?]);
            }
        }
        Ok(total)
    }

    /// Inserts the objects in chunks of `batch_size` rows, one command per chunk.
    ///
    /// Generated keys are not merged back, reload the objects when they are needed.
    pub async fn insert_batch<E: Entity>(&mut self, entities: &[E]) -> Result<RowsAffected> {
        let table = E::describe()?;
        require(&table, table.capabilities.insert, TransactionType::Insert)?;
        for entity in entities {
            validate(entity)?;
        }
        let chunks = self.compile_chunks(entities, |writer, chunk| {
            let rows = chunk.iter().map(|entity| {
                table
                    .columns
                    .iter()
                    .zip(entity.row())
                    .filter(|(c, _)| c.insertable())
                    .map(|(c, v)| (c.column_ref, PropertyExpression::literal(v)))
                    .collect::<Vec<_>>()
            });
            if writer.supports_multi_row_insert() {
                let mut builder =
                    QueryExpression::statement_on(TransactionType::Insert, table.clone());
                for row in rows {
                    builder = builder.values(row);
                }
                Ok(vec![writer.compile(&builder.build()?)?])
            } else {
                rows.map(|row| {
                    let query =
                        QueryExpression::statement_on(TransactionType::Insert, table.clone())
                            .values(row)
                            .build()?;
                    writer.compile(&query)
                })
                .collect()
            }
        })?;
        let result = self.execute_chunks(chunks).await?;
        self.cache.invalidate(table.name);
        Ok(result)
    }

    /// Updates the objects in chunks, each chunk is one `UPDATE` choosing the new values with
    /// `CASE` on the identifiers. Checksums are refreshed but not verified.
    pub async fn update_batch<E: Entity>(&mut self, entities: &mut [E]) -> Result<RowsAffected> {
        let table = E::describe()?;
        require(&table, table.capabilities.update, TransactionType::Update)?;
        for entity in entities.iter() {
            validate(entity)?;
        }
        let chunks = self.compile_chunks(entities, |writer, chunk| {
            let rows: Vec<_> = chunk.iter().map(Entity::row).collect();
            let matches = rows
                .iter()
                .map(|row| identity_condition(&table, row))
                .collect::<Result<Vec<_>>>()?;
            let mut builder = QueryExpression::statement_on(TransactionType::Update, table.clone());
            for (i, column) in table.columns.iter().enumerate() {
                if !column.updatable() {
                    continue;
                }
                let value = PropertyExpression::Case {
                    branches: matches
                        .iter()
                        .zip(&rows)
                        .map(|(m, row)| (m.clone(), PropertyExpression::literal(row[i].clone())))
                        .collect(),
                    otherwise: Box::new(column.column_ref.into()),
                };
                builder = builder.set(column.column_ref, value);
            }
            let query = builder.filter(identities_condition(&table, &rows)?).build()?;
            Ok(vec![writer.compile(&query)?])
        })?;
        let result = self.execute_chunks(chunks).await?;
        for entity in entities.iter_mut() {
            Self::refresh_checksum(entity)?;
        }
        self.cache.invalidate(table.name);
        Ok(result)
    }

    /// Deletes the objects in chunks, one `DELETE .. WHERE id IN (..)` per chunk.
    pub async fn delete_batch<E: Entity>(&mut self, entities: &[E]) -> Result<RowsAffected> {
        let table = E::describe()?;
        require(&table, table.capabilities.delete, TransactionType::Delete)?;
        let chunks = self.compile_chunks(entities, |writer, chunk| {
            let rows: Vec<_> = chunk.iter().map(Entity::row).collect();
            let query = QueryExpression::statement_on(TransactionType::Delete, table.clone())
                .filter(identities_condition(&table, &rows)?)
                .build()?;
            Ok(vec![writer.compile(&query)?])
        })?;
        let result = self.execute_chunks(chunks).await?;
        self.cache.invalidate(table.name);
        Ok(result)
    }

    /// Starts a transaction, or enlists in the active one.
    ///
    /// Only the outermost call owns the transaction, nested tokens just leave it on commit.
    pub async fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<TransactionToken> {
        let isolation = isolation.unwrap_or(self.config.isolation);
        if self.transaction.is_active() {
            if isolation != self.transaction.isolation {
                log::warn!(
                    "Joining a {} transaction, the requested {} isolation is ignored",
                    self.transaction.isolation,
                    isolation
                );
            }
            self.transaction.depth += 1;
            return Ok(TransactionToken {
                owner: false,
                isolation: self.transaction.isolation,
            });
        }
        let mut text = String::new();
        self.writer.write_transaction_begin(&mut text, isolation);
        self.run(StorageCommand::new(text)).await?;
        self.transaction.depth = 1;
        self.transaction.invalidated = false;
        self.transaction.isolation = isolation;
        Ok(TransactionToken {
            owner: true,
            isolation,
        })
    }

    /// Commits when `token` owns the transaction (or `force` is set), otherwise leaves it.
    ///
    /// Fails when a rollback already invalidated the transaction.
    pub async fn commit(&mut self, token: TransactionToken, force: bool) -> Result<()> {
        if !self.transaction.is_active() {
            return Err(ErrorKind::invalid_operation("No active transaction to commit").into());
        }
        if self.transaction.invalidated {
            self.leave(&token);
            return Err(ErrorKind::invalid_operation(
                "The transaction was rolled back and cannot be committed",
            )
            .into());
        }
        if token.owner || force {
            let mut text = String::new();
            self.writer.write_transaction_commit(&mut text);
            let result = self.run(StorageCommand::new(text)).await;
            self.transaction.reset();
            result?;
        } else {
            self.transaction.depth -= 1;
        }
        Ok(())
    }

    /// Rolls back the whole transaction, whatever the token. Enclosing scopes cannot commit
    /// anymore.
    pub async fn rollback(&mut self, token: TransactionToken) -> Result<()> {
        if !self.transaction.is_active() {
            return Err(ErrorKind::invalid_operation("No active transaction to roll back").into());
        }
        let result = if self.transaction.invalidated {
            Ok(())
        } else {
            let mut text = String::new();
            self.writer.write_transaction_rollback(&mut text);
            self.transaction.invalidated = true;
            self.run(StorageCommand::new(text)).await.map(|_| ())
        };
        self.cache.clear();
        self.leave(&token);
        result
    }

    fn leave(&mut self, token: &TransactionToken) {
        self.transaction.depth = self.transaction.depth.saturating_sub(1);
        if token.owner || self.transaction.depth == 0 {
            self.transaction.reset();
        }
    }

    /// Loads the related objects stored in `field` of `parent`.
    ///
    /// Returns `None` when the relation does not allow preloading.
    pub async fn load_related<P: Entity, C: Entity>(
        &mut self,
        parent: &P,
        field: &str,
        preload: &Preload,
    ) -> Result<Option<Vec<C>>> {
        let table = P::describe()?;
        let relation = table.relation(field).ok_or_else(|| ErrorKind::MissingColumnDescriptor {
            type_name: table.type_name,
            member: field.to_string(),
        })?;
        if relation.target != C::TABLE_NAME {
            return Err(ErrorKind::InvalidOperation(format!(
                "Relation `{}.{}` targets `{}`, not `{}`",
                table.type_name,
                field,
                relation.target,
                C::TABLE_NAME
            ))
            .into());
        }
        if !relation.allow_preload {
            log::warn!(
                "Relation `{}.{}` does not allow preloading, skipped",
                table.type_name,
                field
            );
            return Ok(None);
        }
        let Some(local) = table
            .columns
            .iter()
            .position(|c| c.name() == relation.local_column)
        else {
            return Err(ErrorKind::MissingColumnDescriptor {
                type_name: table.type_name,
                member: relation.local_column.to_string(),
            }
            .into());
        };
        let Some(key) = parent.row().into_iter().nth(local).filter(|v| !v.is_null()) else {
            return Ok(Some(Vec::new()));
        };
        let target = C::describe()?;
        let Some(foreign) = target.column(relation.foreign_column) else {
            return Err(ErrorKind::MissingColumnDescriptor {
                type_name: target.type_name,
                member: relation.foreign_column.to_string(),
            }
            .into());
        };
        let condition = foreign
            .column_ref
            .equal(PropertyExpression::literal(key));
        let query = QueryExpression::new()
            .from_table(target.clone())
            .filter(condition)
            .build()?;
        Ok(Some(self.select_with::<C>(&query, preload).await?))
    }

    pub async fn create_table<E: Entity>(&mut self, if_not_exists: bool) -> Result<()> {
        let table = E::describe()?;
        let mut text = String::new();
        self.writer
            .write_create_table(&mut text, &table, if_not_exists)?;
        self.run(StorageCommand::new(text)).await?;
        Ok(())
    }

    pub async fn drop_table<E: Entity>(&mut self, if_exists: bool) -> Result<()> {
        let table = E::describe()?;
        let mut text = String::new();
        self.writer.write_drop_table(&mut text, &table, if_exists);
        self.run(StorageCommand::new(text)).await?;
        self.cache.invalidate(table.name);
        Ok(())
    }

    /// Drops every cached result.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached results.
    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }

    /// First entity of a stream, the rest of the stream is dropped.
    pub async fn first<E: Entity>(&mut self, query: &Query) -> Result<Option<E>> {
        let mut stream = pin!(self.stream::<E>(query));
        stream.next().await.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnRef, Connection, Driver, GenericSqlWriter, QueryResult, error_kind};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct MockDriver;

    impl Driver for MockDriver {
        type Connection = MockExecutor;
        type SqlWriter = GenericSqlWriter;
        const NAME: &'static str = "mock";
        fn sql_writer(&self) -> GenericSqlWriter {
            GenericSqlWriter::new()
        }
    }

    /// Records the commands, answers selects with the queued result sets.
    #[derive(Default)]
    struct MockExecutor {
        driver: MockDriver,
        commands: Vec<String>,
        results: VecDeque<Vec<RowLabeled>>,
    }

    impl Executor for MockExecutor {
        type Driver = MockDriver;
        fn driver(&self) -> &MockDriver {
            &self.driver
        }
        fn run(&mut self, command: StorageCommand) -> impl Stream<Item = Result<QueryResult>> + Send {
            self.commands.push(command.text.clone());
            let items: Vec<Result<QueryResult>> =
                if command.transaction_type() == Some(TransactionType::Select) {
                    self.results
                        .pop_front()
                        .unwrap_or_default()
                        .into_iter()
                        .map(|v| Ok(v.into()))
                        .collect()
                } else {
                    vec![Ok(RowsAffected {
                        rows_affected: 1,
                        last_affected_id: None,
                    }
                    .into())]
                };
            stream::iter(items)
        }
    }

    impl Connection for MockExecutor {
        async fn connect(_url: &str) -> Result<Self> {
            Ok(Self::default())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Part {
        id: i64,
        name: String,
        checksum: Option<u64>,
    }

    impl Entity for Part {
        const TABLE_NAME: &'static str = "Part";
        const TRACKS_CHECKSUM: bool = true;

        fn declare() -> TableDescriptor {
            TableDescriptor {
                type_name: "Part",
                name: "Part",
                columns: vec![
                    ColumnDescriptor {
                        column_ref: ColumnRef::new("Id", "Part", ""),
                        field: "id",
                        value: Value::Int64(None),
                        identifier: true,
                        ..Default::default()
                    },
                    ColumnDescriptor {
                        column_ref: ColumnRef::new("Name", "Part", ""),
                        field: "name",
                        value: Value::Varchar(None),
                        ordinal: 1,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }
        }
        fn from_row(mut row: RowLabeled) -> Result<Self> {
            Ok(Part {
                id: i64::try_from_value(row.take_column("Id").unwrap_or(Value::Null))?,
                name: String::try_from_value(row.take_column("Name").unwrap_or(Value::Null))?,
                checksum: None,
            })
        }
        fn row(&self) -> Vec<Value> {
            vec![self.id.as_value(), self.name.clone().as_value()]
        }
        fn set_column(&mut self, column: &str, value: Value) -> Result<()> {
            match column {
                "Id" => self.id = i64::try_from_value(value)?,
                "Name" => self.name = String::try_from_value(value)?,
                _ => {}
            }
            Ok(())
        }
        fn checksum(&self) -> Option<u64> {
            self.checksum
        }
        fn set_checksum(&mut self, checksum: Option<u64>) {
            self.checksum = checksum;
        }
    }

    fn stored(id: i64, name: &str) -> RowLabeled {
        RowLabeled::new(
            ["Id".to_string(), "Name".to_string()].into(),
            [Value::Int64(Some(id)), Value::Varchar(Some(name.into()))].into(),
        )
    }

    fn loaded(id: i64, name: &str) -> Part {
        Binder::bind_row(stored(id, name)).expect("Valid row")
    }

    #[tokio::test]
    async fn nested_transactions_commit_once() {
        let mut session = Session::new(MockExecutor::default());
        let outer = session.begin(None).await.expect("begin");
        let inner = session.begin(Some(IsolationLevel::Serializable)).await.expect("begin");
        assert!(outer.is_owner());
        assert!(!inner.is_owner());
        assert_eq!(inner.isolation(), IsolationLevel::ReadCommitted);
        session.commit(inner, false).await.expect("inner commit");
        assert!(session.in_transaction());
        session.commit(outer, false).await.expect("outer commit");
        assert!(!session.in_transaction());
        assert_eq!(
            session.executor().commands,
            ["START TRANSACTION ISOLATION LEVEL READ COMMITTED;", "COMMIT;"]
        );
    }

    #[tokio::test]
    async fn nested_rollback_poisons_the_owner() {
        let mut session = Session::new(MockExecutor::default());
        let outer = session.begin(None).await.expect("begin");
        let inner = session.begin(None).await.expect("begin");
        session.rollback(inner).await.expect("rollback");
        let error = session.commit(outer, false).await.expect_err("commit must fail");
        assert!(matches!(
            error_kind(&error),
            Some(ErrorKind::InvalidOperation(..))
        ));
        assert!(!session.in_transaction());
        assert_eq!(session.executor().commands.last().map(String::as_str), Some("ROLLBACK;"));

        let token = TransactionToken {
            owner: false,
            isolation: IsolationLevel::ReadCommitted,
        };
        assert!(session.commit(token, true).await.is_err());
    }

    #[tokio::test]
    async fn forced_commit_from_a_nested_scope() {
        let mut session = Session::new(MockExecutor::default());
        let _outer = session.begin(None).await.expect("begin");
        let inner = session.begin(None).await.expect("begin");
        session.commit(inner, true).await.expect("forced commit");
        assert!(!session.in_transaction());
    }

    #[tokio::test]
    async fn batch_insert_is_chunked() {
        let mut session = Session::new(MockExecutor::default())
            .with_config(Config::default().with_batch_size(50));
        let parts: Vec<_> = (0..250)
            .map(|i| Part {
                id: i,
                name: format!("part {i}"),
                checksum: None,
            })
            .collect();
        let result = session.insert_batch(&parts).await.expect("insert");
        assert_eq!(result.rows_affected, 5);
        let commands = &session.executor().commands;
        assert_eq!(commands.len(), 5);
        assert!(commands.iter().all(|v| v.starts_with("INSERT INTO \"Part\"")));
        assert!(commands.iter().all(|v| v.matches("),\n(").count() == 49));
    }

    #[tokio::test]
    async fn stale_update_is_refused() {
        let mut session = Session::new(MockExecutor::default());
        let mut part = loaded(1, "bolt");
        part.name = "screw".into();
        session.executor().results.push_back(vec![stored(1, "nut")]);
        let error = session.update(&mut part).await.expect_err("stale");
        let Some(ErrorKind::Concurrency { type_name, stale }) = error_kind(&error) else {
            panic!("Unexpected error {error:#}");
        };
        assert_eq!(*type_name, "Part");
        assert_eq!(
            stale.get_column("Name"),
            Some(&Value::Varchar(Some("screw".into())))
        );
        assert_eq!(session.executor().commands.len(), 1);
    }

    #[tokio::test]
    async fn stale_update_is_overwritten_when_ignored() {
        let mut session = Session::new(MockExecutor::default()).with_config(
            Config::default().with_concurrency(ConcurrencyMode::Ignore),
        );
        let mut part = loaded(1, "bolt");
        let before = part.checksum;
        part.name = "screw".into();
        session.executor().results.push_back(vec![stored(1, "nut")]);
        session.update(&mut part).await.expect("update");
        let commands = &session.executor().commands;
        assert_eq!(commands.len(), 2);
        assert!(commands[1].starts_with("UPDATE \"Part\" SET"));
        assert_ne!(part.checksum, before);
    }

    #[tokio::test]
    async fn unchanged_row_updates() {
        let mut session = Session::new(MockExecutor::default());
        let mut part = loaded(3, "bolt");
        part.name = "screw".into();
        session.executor().results.push_back(vec![stored(3, "bolt")]);
        session.update(&mut part).await.expect("update");
        assert_eq!(session.executor().commands.len(), 2);
    }
}
