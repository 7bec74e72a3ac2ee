//! Shared fixtures: fake collaborators and a fully wired engine harness
//! over the in-memory store.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use lineup_core::approval::ApprovalResolution;
use lineup_core::idempotency::IdempotencyGuard;
use lineup_core::models::{ContentCategory, ContentItem, ContentItemPatch, NewContentItem};
use lineup_core::orchestration::lineup::LineupReport;
use lineup_core::orchestration::{IntakeProcessor, LineupReporter, PublishDriver};
use lineup_core::queue::{CategoryLocks, QueueEngine};
use lineup_core::services::{
    ClassifiedReply, CollaboratorError, CollaboratorResult, ContentGenerator, GeneratedBundle,
    GeneratedItem, IntentClassifier, PublishReceipt, Publisher, ReviewTransport,
};
use lineup_core::state_machine::{ContentState, ContentStateMachine};
use lineup_core::store::{ContentStore, InMemoryContentStore};

/// Generator fake: hands back whatever bundle the test configured and
/// revises by tagging the feedback into the body.
pub struct FakeGenerator {
    bundle: Mutex<GeneratedBundle>,
    pub fail_revise: AtomicBool,
}

impl FakeGenerator {
    pub fn returning(items: Vec<GeneratedItem>) -> Arc<Self> {
        Arc::new(Self {
            bundle: Mutex::new(GeneratedBundle {
                assessment: "one idea, one post".to_string(),
                items,
            }),
            fail_revise: AtomicBool::new(false),
        })
    }

    pub fn set_bundle(&self, items: Vec<GeneratedItem>) {
        self.bundle.lock().items = items;
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(&self, _raw_idea: &str) -> CollaboratorResult<GeneratedBundle> {
        Ok(self.bundle.lock().clone())
    }

    async fn revise(&self, original: &str, feedback: &str) -> CollaboratorResult<String> {
        if self.fail_revise.load(Ordering::SeqCst) {
            return Err(CollaboratorError::generation("revision model unavailable"));
        }
        Ok(format!("{original} [revised: {feedback}]"))
    }
}

/// Classifier fake: returns the configured reply for every call.
pub struct FakeClassifier {
    reply: Mutex<ClassifiedReply>,
}

impl FakeClassifier {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(ClassifiedReply {
                intent: "approve".to_string(),
                feedback: None,
            }),
        })
    }

    pub fn set_intent(&self, intent: &str, feedback: Option<&str>) {
        *self.reply.lock() = ClassifiedReply {
            intent: intent.to_string(),
            feedback: feedback.map(str::to_string),
        };
    }
}

#[async_trait]
impl IntentClassifier for FakeClassifier {
    async fn classify(&self, _reply: &str) -> CollaboratorResult<ClassifiedReply> {
        Ok(self.reply.lock().clone())
    }
}

/// Transport fake: records every notification and mints thread ids.
#[derive(Default)]
pub struct FakeTransport {
    next_thread: AtomicUsize,
    pub events: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn event_log(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl ReviewTransport for FakeTransport {
    async fn notify_for_review(&self, items: &[ContentItem]) -> CollaboratorResult<String> {
        let n = self.next_thread.fetch_add(1, Ordering::SeqCst) + 1;
        let thread_id = format!("review-thread-{n}");
        self.events
            .lock()
            .push(format!("review:{thread_id}:{}", items.len()));
        Ok(thread_id)
    }

    async fn notify_revised(&self, item: &ContentItem, thread_id: &str) -> CollaboratorResult<()> {
        self.events
            .lock()
            .push(format!("revised:{thread_id}:{}", item.id));
        Ok(())
    }

    async fn notify_confirmation(&self, thread_id: &str) -> CollaboratorResult<()> {
        self.events.lock().push(format!("confirm:{thread_id}"));
        Ok(())
    }

    async fn send_lineup(&self, report: &LineupReport) -> CollaboratorResult<()> {
        self.events
            .lock()
            .push(format!("lineup:{}", report.categories.len()));
        Ok(())
    }
}

/// Publisher fake: succeeds (recording the item) unless told to fail.
#[derive(Default)]
pub struct FakePublisher {
    pub fail: AtomicBool,
    pub published: Mutex<Vec<Uuid>>,
}

impl FakePublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published_ids(&self) -> Vec<Uuid> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, item: &ContentItem) -> CollaboratorResult<PublishReceipt> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::publish("target returned 500"));
        }
        self.published.lock().push(item.id);
        Ok(PublishReceipt {
            external_id: format!("ext-{}", item.id),
        })
    }
}

/// Fully wired engine over the in-memory store.
pub struct Harness {
    pub store: Arc<InMemoryContentStore>,
    pub machine: Arc<ContentStateMachine>,
    pub queue: Arc<QueueEngine>,
    pub intake: IntakeProcessor,
    pub driver: PublishDriver,
    pub reporter: LineupReporter,
    pub generator: Arc<FakeGenerator>,
    pub classifier: Arc<FakeClassifier>,
    pub transport: Arc<FakeTransport>,
    pub blog_publisher: Arc<FakePublisher>,
    pub linkedin_publisher: Arc<FakePublisher>,
}

impl Harness {
    pub fn with_generated(items: Vec<GeneratedItem>) -> Self {
        let store = Arc::new(InMemoryContentStore::new());
        let store_dyn: Arc<dyn ContentStore> = store.clone();

        let machine = Arc::new(ContentStateMachine::new(store_dyn.clone()));
        let locks = CategoryLocks::new();
        let queue = Arc::new(QueueEngine::new(
            store_dyn.clone(),
            machine.clone(),
            locks,
        ));

        let generator = FakeGenerator::returning(items);
        let classifier = FakeClassifier::approving();
        let transport = FakeTransport::new();
        let blog_publisher = FakePublisher::new();
        let linkedin_publisher = FakePublisher::new();

        let resolution = ApprovalResolution::new(machine.clone(), queue.clone());
        let guard = IdempotencyGuard::new(store_dyn.clone());
        let intake = IntakeProcessor::new(
            store_dyn.clone(),
            machine.clone(),
            resolution,
            guard,
            generator.clone(),
            classifier.clone(),
            transport.clone(),
        );

        let driver = PublishDriver::new(queue.clone(), machine.clone())
            .with_publisher(ContentCategory::Blog, blog_publisher.clone())
            .with_publisher(ContentCategory::Linkedin, linkedin_publisher.clone());

        let reporter = LineupReporter::new(queue.clone(), transport.clone());

        Self {
            store,
            machine,
            queue,
            intake,
            driver,
            reporter,
            generator,
            classifier,
            transport,
            blog_publisher,
            linkedin_publisher,
        }
    }

    pub fn new() -> Self {
        Self::with_generated(vec![GeneratedItem {
            category: ContentCategory::Linkedin,
            title: None,
            body: "A quick automation insight.".to_string(),
        }])
    }

    /// Run a fresh idea through intake; returns the review thread id and
    /// the id of the item now pending approval.
    pub async fn generate_first(&self, idea: &str) -> (String, Uuid) {
        let outcome = self
            .intake
            .process_inbound(lineup_core::orchestration::InboundTrigger {
                thread_id: format!("idea-{}", Uuid::new_v4()),
                received_at: chrono::Utc::now(),
                body: idea.to_string(),
            })
            .await
            .expect("intake of a fresh idea");
        match outcome {
            lineup_core::orchestration::IntakeOutcome::ContentGenerated {
                review_thread_id,
                content_ids,
                ..
            } => (review_thread_id, content_ids[0]),
            other => panic!("expected ContentGenerated, got {other:?}"),
        }
    }

    /// Deliver a reply on a review thread.
    pub async fn reply(
        &self,
        thread_id: &str,
        received_at: chrono::DateTime<chrono::Utc>,
        body: &str,
    ) -> Result<lineup_core::orchestration::IntakeOutcome, lineup_core::orchestration::IntakeError>
    {
        self.intake
            .process_inbound(lineup_core::orchestration::InboundTrigger {
                thread_id: thread_id.to_string(),
                received_at,
                body: body.to_string(),
            })
            .await
    }

    /// Insert an item and walk it straight to `approved` via store patches,
    /// for tests that only care about queue behavior.
    pub async fn seed_approved(&self, category: ContentCategory, body: &str) -> ContentItem {
        let item = self
            .store
            .insert(NewContentItem::new(category, None, body))
            .await
            .expect("insert seeded item");
        self.store
            .update_fields(item.id, ContentItemPatch::state(ContentState::Approved))
            .await
            .expect("approve seeded item")
    }

    /// Seed an approved item and enqueue it; returns (item, position).
    pub async fn seed_queued(&self, category: ContentCategory, body: &str) -> (ContentItem, i32) {
        let item = self.seed_approved(category, body).await;
        let position = self
            .queue
            .enqueue(item.id, category)
            .await
            .expect("enqueue seeded item");
        let item = self
            .store
            .get(item.id)
            .await
            .expect("reload seeded item")
            .expect("seeded item exists");
        (item, position)
    }

    /// Current positions for a category, sorted ascending.
    pub async fn positions(&self, category: ContentCategory) -> Vec<i32> {
        let items = self
            .queue
            .upcoming(category, i64::MAX)
            .await
            .expect("read queue");
        items.iter().filter_map(|i| i.queue_position).collect()
    }

    /// Assert the occupied position set is exactly {1..=k}.
    pub async fn assert_contiguous(&self, category: ContentCategory) {
        let positions = self.positions(category).await;
        let expected: Vec<i32> = (1..=positions.len() as i32).collect();
        assert_eq!(
            positions, expected,
            "queue for {category} must be contiguous from 1"
        );
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
