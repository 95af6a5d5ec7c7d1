use mongokit::collection::{CollectionHandle, DatabaseHandle, Document};
use mongokit::doc;
use mongokit::errors::MongoKitResult;
use mongokit::options::{CollectionOptions, DatabaseOptions};
use mongokit::store::memory::{InMemoryConnector, InMemoryStore};
use mongokit::store::StreamTracker;
use mongokit::{Client, Descriptor, DescriptorBuilder, DescriptorProvider};
use std::backtrace::Backtrace;
use std::time::Instant;

pub const DESCRIPTOR_NAME: &str = "main";
pub const DATABASE_NAME: &str = "app";

/// Runs `test` between `before` and `after`. `after` runs even when the
/// test fails, and any failure panics with the error and a backtrace.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> MongoKitResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> MongoKitResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> MongoKitResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();
    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    match result {
        Ok(Ok(_)) => {}
        Ok(Err((e, bt))) => {
            eprintln!("\n==================== TEST FAILED ====================");
            eprintln!("Took {:?}", start_time.elapsed());
            eprintln!("Error: {}", e);
            if !bt.is_empty() && !bt.contains("disabled") {
                eprintln!("\nBacktrace:\n{}", bt);
            }
            eprintln!("=====================================================\n");
            panic!("{}", e);
        }
        Err(panic_err) => std::panic::resume_unwind(panic_err),
    }
}

/// A provider with one registered descriptor over a fresh in-memory store.
#[derive(Clone)]
pub struct TestContext {
    provider: DescriptorProvider,
    store: InMemoryStore,
}

impl TestContext {
    pub fn provider(&self) -> DescriptorProvider {
        self.provider.clone()
    }

    pub fn descriptor(&self) -> Descriptor {
        // registered by create_test_context_with
        self.provider
            .default_descriptor()
            .unwrap_or_else(|| panic!("descriptor {} is not registered", DESCRIPTOR_NAME))
    }

    pub fn client(&self) -> MongoKitResult<Client> {
        self.descriptor().client()
    }

    pub fn database(&self) -> MongoKitResult<DatabaseHandle> {
        self.client()?.default_database()
    }

    pub fn collection(&self, name: &str) -> MongoKitResult<CollectionHandle> {
        self.database()?.collection(name)
    }

    /// The backing store, for inspecting data behind the handles.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn tracker(&self) -> &StreamTracker {
        self.store.tracker()
    }
}

pub fn create_test_context() -> MongoKitResult<TestContext> {
    create_test_context_with(|builder| builder)
}

/// Like [create_test_context] with extra builder settings applied before
/// the connector is attached.
pub fn create_test_context_with<F>(configure: F) -> MongoKitResult<TestContext>
where
    F: FnOnce(DescriptorBuilder) -> DescriptorBuilder,
{
    let store = InMemoryStore::new();
    let builder = Descriptor::builder(DESCRIPTOR_NAME)
        .address("localhost:27017")
        .default_database(DATABASE_NAME);
    let descriptor = configure(builder)
        .connector(InMemoryConnector::with_store(store.clone()))
        .build()?;

    let provider = DescriptorProvider::new(DESCRIPTOR_NAME);
    provider.register(descriptor)?;
    Ok(TestContext { provider, store })
}

/// A context where `app.users` creates identifiers and the rest of `app`
/// does not.
pub fn create_override_test_context() -> MongoKitResult<TestContext> {
    create_test_context_with(|builder| {
        builder.create_id(true).database(
            DATABASE_NAME,
            DatabaseOptions::new()
                .create_id(false)
                .collection("users", CollectionOptions::new().create_id(true)),
        )
    })
}

pub fn cleanup(ctx: TestContext) -> MongoKitResult<()> {
    let report = ctx.provider.close();
    if let Some((name, err)) = report.failures().first() {
        log::error!("Descriptor {} failed to close: {}", name, err);
        return Err(err.clone());
    }
    Ok(())
}

pub fn people() -> Vec<Document> {
    vec![
        doc! { name: "ann", age: 31, city: "NYC", tags: ["admin", "ops"] },
        doc! { name: "bob", age: 25, city: "LA", tags: ["dev"] },
        doc! { name: "cat", age: 42, city: "NYC", tags: ["dev", "ops"] },
        doc! { name: "dan", age: 19, city: "SF", tags: [] },
        doc! { name: "eve", age: 36, city: "LA", tags: ["admin"] },
    ]
}

pub fn insert_people(collection: &CollectionHandle) -> MongoKitResult<()> {
    collection.insert_many(people())?;
    Ok(())
}

pub fn orders() -> Vec<Document> {
    vec![
        doc! { cust: "a", item: "pen", qty: 2, price: 1.5 },
        doc! { cust: "b", item: "ink", qty: 1, price: 7.0 },
        doc! { cust: "a", item: "pad", qty: 5, price: 3.0 },
        doc! { cust: "c", item: "pen", qty: 10, price: 1.5 },
        doc! { cust: "b", item: "pen", qty: 3, price: 1.5 },
    ]
}

pub fn insert_orders(collection: &CollectionHandle) -> MongoKitResult<()> {
    collection.insert_many(orders())?;
    Ok(())
}

pub fn is_hex_identifier(value: &str) -> bool {
    value.len() == 24 && value.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
