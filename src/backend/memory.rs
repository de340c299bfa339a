use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::auth::{AuthChangeEvent, Session, User};
use crate::backend::Backend;
use crate::error::{DeleteFailure, LoadFailure, LoginFailure, SaveFailure, SessionFailure};
use crate::model::{RecordFields, RecordId, SubstitutionRecord};

/// Backend operations, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
    SignIn,
    SignOut,
    CurrentSession,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(RecordFields),
    Update(RecordId, RecordFields),
    Delete(RecordId),
    SignIn(String),
    SignOut,
    CurrentSession,
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::List => Operation::List,
            Call::Create(_) => Operation::Create,
            Call::Update(..) => Operation::Update,
            Call::Delete(_) => Operation::Delete,
            Call::SignIn(_) => Operation::SignIn,
            Call::SignOut => Operation::SignOut,
            Call::CurrentSession => Operation::CurrentSession,
        }
    }
}

/// In-process [`Backend`] that behaves like the hosted one: public reads,
/// writes only with a session, ids assigned on insert.
///
/// Every call is logged so tests can assert what reached the backend.
pub struct MemoryBackend {
    records: Mutex<Vec<SubstitutionRecord>>,
    accounts: Mutex<HashMap<String, String>>,
    session: Mutex<Option<Session>>,
    failing: Mutex<HashSet<Operation>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    changes: broadcast::Sender<AuthChangeEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            records: Mutex::new(Vec::new()),
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            changes,
        }
    }

    /// Seed records, assigning ids in order
    pub fn with_records<I>(self, records: I) -> Self
    where
        I: IntoIterator<Item = RecordFields>,
    {
        for fields in records {
            self.insert(fields);
        }
        self
    }

    /// Register an account that can sign in
    pub fn with_account(self, email: &str, password: &str) -> Self {
        lock(&self.accounts).insert(email.to_string(), password.to_string());
        self
    }

    fn insert(&self, fields: RecordFields) -> RecordId {
        let id = RecordId::Int(self.next_id.fetch_add(1, Ordering::SeqCst));
        lock(&self.records).push(fields.into_record(id.clone()));
        id
    }

    /// Make every later call of `operation` fail
    pub fn fail(&self, operation: Operation) {
        lock(&self.failing).insert(operation);
    }

    /// Undo [`MemoryBackend::fail`]
    pub fn recover(&self, operation: Operation) {
        lock(&self.failing).remove(&operation);
    }

    /// Calls made so far
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Number of calls made of `operation`
    pub fn count(&self, operation: Operation) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Forget the call log
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Current stored records, unordered
    pub fn records(&self) -> Vec<SubstitutionRecord> {
        lock(&self.records).clone()
    }

    /// Drop the session as if the server revoked it
    pub fn invalidate_session(&self) {
        *lock(&self.session) = None;
        let _ = self.changes.send(AuthChangeEvent::signed_out());
    }

    fn record(&self, call: Call) -> bool {
        let operation = call.operation();
        lock(&self.calls).push(call);
        !lock(&self.failing).contains(&operation)
    }

    fn signed_in(&self) -> bool {
        lock(&self.session).is_some()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list(&self) -> Result<Vec<SubstitutionRecord>, LoadFailure> {
        if !self.record(Call::List) {
            return Err(LoadFailure::new(LoadFailure::DEFAULT_MESSAGE));
        }
        let mut records = self.records();
        records.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(records)
    }

    async fn create(&self, fields: &RecordFields) -> Result<(), SaveFailure> {
        if !self.record(Call::Create(fields.clone())) || !self.signed_in() {
            return Err(SaveFailure::new(SaveFailure::DEFAULT_MESSAGE));
        }
        self.insert(fields.clone());
        Ok(())
    }

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> Result<(), SaveFailure> {
        if !self.record(Call::Update(id.clone(), fields.clone())) || !self.signed_in() {
            return Err(SaveFailure::new(SaveFailure::DEFAULT_MESSAGE));
        }
        let mut records = lock(&self.records);
        match records.iter_mut().find(|r| &r.id == id) {
            Some(record) => {
                *record = fields.clone().into_record(id.clone());
                Ok(())
            }
            None => Err(SaveFailure::new(SaveFailure::DEFAULT_MESSAGE)),
        }
    }

    async fn delete(&self, id: &RecordId) -> Result<(), DeleteFailure> {
        if !self.record(Call::Delete(id.clone())) || !self.signed_in() {
            return Err(DeleteFailure::new(DeleteFailure::DEFAULT_MESSAGE));
        }
        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(DeleteFailure::new(DeleteFailure::DEFAULT_MESSAGE));
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, LoginFailure> {
        if !self.record(Call::SignIn(email.to_string())) {
            return Err(LoginFailure::new(LoginFailure::DEFAULT_MESSAGE));
        }
        let known = lock(&self.accounts)
            .get(email)
            .map_or(false, |expected| expected == password);
        if !known {
            return Err(LoginFailure::new(LoginFailure::DEFAULT_MESSAGE));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Session::new(
            format!("memory-access-{}", n),
            format!("memory-refresh-{}", n),
            Some(User::new(&format!("user-{}", email), Some(email))),
            3600,
        );
        *lock(&self.session) = Some(session.clone());
        let _ = self.changes.send(AuthChangeEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), SessionFailure> {
        let ok = self.record(Call::SignOut);
        *lock(&self.session) = None;
        let _ = self.changes.send(AuthChangeEvent::signed_out());
        if ok {
            Ok(())
        } else {
            Err(SessionFailure::new(SessionFailure::DEFAULT_MESSAGE))
        }
    }

    async fn current_session(&self) -> Result<Option<Session>, SessionFailure> {
        if !self.record(Call::CurrentSession) {
            return Err(SessionFailure::new(SessionFailure::DEFAULT_MESSAGE));
        }
        Ok(lock(&self.session).clone())
    }

    fn on_session_change(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.changes.subscribe()
    }
}
