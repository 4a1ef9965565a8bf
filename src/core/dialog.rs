use crate::core::form::UnitForm;
use crate::core::gateway::{PersistenceGateway, SaveOutcome};
use crate::core::ranges::{BlockedCepList, CepRangeList, RangeField};
use crate::domain::model::{CepRangeEntry, FieldValue, Notification, Unit, UnitField};
use crate::domain::ports::{Backend, Notifier};
use tracing::Instrument;

const SAVE_FAILED: &str = "Erro ao salvar unidade e CEPs";
const UNIT_CREATED: &str = "Unidade criada com sucesso";
const UNIT_UPDATED: &str = "Unidade atualizada com sucesso";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Unsaved,
    Saving,
    Saved,
    Failed,
}

pub type SuccessCallback = Box<dyn FnMut(&SaveOutcome) + Send>;

/// Headless create/edit dialog for a unit and its CEP ranges.
///
/// Every failure is logged and, for saves, reported through the notifier;
/// nothing is returned to the caller as an error.
pub struct UnitDialog<B: Backend, N: Notifier> {
    gateway: PersistenceGateway<B>,
    notifier: N,
    defaults: Unit,
    form: UnitForm,
    ranges: CepRangeList,
    blocked: BlockedCepList,
    editing: bool,
    open: bool,
    status: SaveStatus,
    on_success: Option<SuccessCallback>,
}

impl<B: Backend, N: Notifier> UnitDialog<B, N> {
    pub fn new(backend: B, notifier: N) -> Self {
        Self {
            gateway: PersistenceGateway::new(backend),
            notifier,
            defaults: Unit::default(),
            form: UnitForm::default(),
            ranges: CepRangeList::new(),
            blocked: BlockedCepList::default(),
            editing: false,
            open: false,
            status: SaveStatus::Unsaved,
            on_success: None,
        }
    }

    /// Draft used whenever the dialog opens for a new unit.
    pub fn with_defaults(mut self, defaults: Unit) -> Self {
        self.form = UnitForm::new(defaults.clone());
        self.defaults = defaults;
        self
    }

    pub fn on_success(mut self, callback: impl FnMut(&SaveOutcome) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Opens for an existing unit (seeds the draft and loads its ranges) or,
    /// with `None`, for a new one starting from the configured defaults.
    pub async fn open(&mut self, unit: Option<Unit>) {
        self.open = true;
        self.status = SaveStatus::Unsaved;
        self.editing = unit.is_some();

        match unit {
            Some(unit) if !unit.is_new() => {
                tracing::info!(unit_id = unit.id, "opening unit for edit");
                let unit_id = unit.id;
                self.form.seed(unit);
                self.reload_ranges(unit_id).await;
            }
            _ => {
                tracing::debug!("opening dialog for a new unit");
                self.form.seed(self.defaults.clone());
                self.ranges.clear();
            }
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn cancel(&mut self) {
        tracing::debug!("dialog cancelled");
        self.close();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn title(&self) -> &'static str {
        if self.editing {
            "Editar Unidade"
        } else {
            "Nova Unidade"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing {
            "Salvar Alterações"
        } else {
            "Criar Unidade"
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn draft(&self) -> &Unit {
        self.form.draft()
    }

    pub fn form_mut(&mut self) -> &mut UnitForm {
        &mut self.form
    }

    pub fn set_field(&mut self, field: UnitField, value: FieldValue) -> bool {
        match self.form.set_field(field, value) {
            Ok(()) => {
                tracing::debug!(%field, "draft field changed");
                true
            }
            Err(e) => {
                tracing::warn!(%field, error = %e, "draft field rejected");
                false
            }
        }
    }

    pub fn ranges(&self) -> &[CepRangeEntry] {
        self.ranges.entries()
    }

    pub fn add_range(&mut self) {
        self.ranges.add_empty();
    }

    pub fn edit_range(&mut self, index: usize, field: RangeField, raw: &str) -> bool {
        match self.ranges.edit(index, field, raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(index, error = %e, "range edit rejected");
                false
            }
        }
    }

    /// Removes a range, deleting it remotely first when it was saved before.
    pub async fn remove_range(&mut self, index: usize) -> bool {
        match self.gateway.remove_range(&mut self.ranges, index).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(index, error = %e, "failed to remove CEP range");
                false
            }
        }
    }

    pub fn blocked_ceps(&self) -> &[String] {
        self.blocked.ceps()
    }

    /// Only full eight-digit CEPs are taken; anything else is ignored.
    pub fn add_blocked_cep(&mut self, cep: &str) -> bool {
        self.blocked.add(cep)
    }

    pub fn remove_blocked_cep(&mut self, cep: &str) {
        self.blocked.remove(cep);
    }

    /// Reads the unit's blocked CEPs. Nothing writes them back.
    pub async fn refresh_blocked_ceps(&mut self) {
        let unit_id = self.form.draft().id;
        if unit_id == 0 {
            return;
        }
        match self.gateway.load_blocked_ceps(unit_id).await {
            Ok(ceps) => self.blocked.replace_all(ceps),
            Err(e) => tracing::error!(unit_id, error = %e, "failed to load blocked CEPs"),
        }
    }

    pub async fn save(&mut self) -> SaveStatus {
        self.status = SaveStatus::Saving;
        let span = tracing::info_span!("unit_save", unit_id = self.form.draft().id);

        let result = self
            .gateway
            .save(self.form.draft(), &mut self.ranges)
            .instrument(span.clone())
            .await;

        match result {
            Ok(outcome) => {
                if !outcome.skipped.is_empty() {
                    tracing::warn!(
                        parent: &span,
                        count = outcome.skipped.len(),
                        "excluded segments not saved"
                    );
                }
                tracing::info!(
                    parent: &span,
                    unit_id = outcome.unit_id,
                    served = outcome.served_written,
                    excluded = outcome.excluded_written,
                    "unit saved"
                );

                self.reload_ranges(outcome.unit_id).await;
                self.notifier.notify(Notification::success(if outcome.created {
                    UNIT_CREATED
                } else {
                    UNIT_UPDATED
                }));
                if let Some(callback) = self.on_success.as_mut() {
                    callback(&outcome);
                }
                self.status = SaveStatus::Saved;
                self.close();
            }
            Err(e) => {
                tracing::error!(parent: &span, error = %e, "failed to save unit and CEP ranges");
                self.notifier.notify(Notification::error(SAVE_FAILED));
                self.status = SaveStatus::Failed;
            }
        }

        self.status
    }

    /// Replaces the list with the backend's rows, or empties it on failure.
    async fn reload_ranges(&mut self, unit_id: i64) {
        match self.gateway.load_ranges(unit_id).await {
            Ok(entries) => self.ranges.replace_all(entries),
            Err(e) => {
                tracing::error!(unit_id, error = %e, "failed to load CEP ranges");
                self.ranges.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{Call, RecordingBackend, RecordingNotifier};
    use crate::domain::model::{NotificationLevel, RangeKind};
    use crate::domain::ports::{EXCLUDED_TABLE, SERVED_TABLE, UNIT_TABLE};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn seeded_backend() -> RecordingBackend {
        let backend = RecordingBackend::new();
        backend.seed_rows(
            SERVED_TABLE,
            vec![json!({"id": 7, "unidade_id": 42, "cep_inicial": "01000", "cep_final": "02000"})],
        );
        backend.seed_rows(
            EXCLUDED_TABLE,
            vec![json!({"id": 9, "unidade_id": 42, "cep_base": "01500", "faixa_excluida": "123"})],
        );
        backend
    }

    fn existing_unit() -> Unit {
        Unit {
            id: 42,
            nome: "Unidade Centro".to_string(),
            ..Unit::default()
        }
    }

    #[tokio::test]
    async fn test_open_new_then_save_inserts_unit_then_range() {
        let backend = RecordingBackend::new();
        let notifier = RecordingNotifier::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut dialog = UnitDialog::new(backend.clone(), notifier.clone()).on_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dialog.open(None).await;
        assert_eq!(dialog.title(), "Nova Unidade");
        assert_eq!(dialog.submit_label(), "Criar Unidade");
        dialog.add_range();
        assert!(dialog.edit_range(0, RangeField::CepInicial, "1000"));
        assert!(dialog.edit_range(0, RangeField::CepFinal, "2000"));

        assert_eq!(dialog.save().await, SaveStatus::Saved);

        let writes = backend.writes();
        assert_eq!(writes.len(), 2);
        assert!(matches!(&writes[0], Call::Insert { table, .. } if table == UNIT_TABLE));
        match &writes[1] {
            Call::Insert { table, row } => {
                assert_eq!(table, SERVED_TABLE);
                assert_eq!(row["cep_inicial"], json!("01000"));
                assert_eq!(row["cep_final"], json!("02000"));
            }
            other => panic!("unexpected call {:?}", other),
        }

        assert!(!dialog.is_open());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        let seen = notifier.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NotificationLevel::Success);
        assert_eq!(seen[0].description, UNIT_CREATED);
    }

    #[tokio::test]
    async fn test_open_existing_loads_tagged_entries() {
        let backend = seeded_backend();
        let mut dialog = UnitDialog::new(backend, RecordingNotifier::default());

        dialog.open(Some(existing_unit())).await;

        assert!(dialog.is_open());
        assert_eq!(dialog.title(), "Editar Unidade");
        assert_eq!(dialog.draft().nome, "Unidade Centro");
        let ranges = dialog.ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].kind, RangeKind::Served);
        assert_eq!(ranges[0].id, Some(7));
        assert_eq!(ranges[1].kind, RangeKind::Excluded);
        assert_eq!(ranges[1].id, Some(9));
        assert_eq!(ranges[1].cep_base, "01500");
        assert_eq!(ranges[1].faixa_excluida, "123");
    }

    #[tokio::test]
    async fn test_remove_excluded_entry_deletes_remotely_first() {
        let backend = seeded_backend();
        let mut dialog = UnitDialog::new(backend.clone(), RecordingNotifier::default());
        dialog.open(Some(existing_unit())).await;

        assert!(dialog.remove_range(1).await);

        assert_eq!(
            backend.writes(),
            vec![Call::Delete {
                table: EXCLUDED_TABLE.to_string(),
                id: 9
            }]
        );
        assert_eq!(dialog.ranges().len(), 1);
        assert_eq!(dialog.ranges()[0].id, Some(7));
    }

    #[tokio::test]
    async fn test_remove_failure_keeps_entry() {
        let backend = seeded_backend();
        let mut dialog = UnitDialog::new(backend.clone(), RecordingNotifier::default());
        dialog.open(Some(existing_unit())).await;
        backend.fail_on(EXCLUDED_TABLE);

        assert!(!dialog.remove_range(1).await);
        assert_eq!(dialog.ranges().len(), 2);
    }

    #[tokio::test]
    async fn test_unit_write_failure_keeps_dialog_open() {
        let backend = RecordingBackend::new();
        backend.fail_on(UNIT_TABLE);
        let notifier = RecordingNotifier::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut dialog = UnitDialog::new(backend.clone(), notifier.clone()).on_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dialog.open(None).await;
        dialog.add_range();
        dialog.edit_range(0, RangeField::CepInicial, "1000");
        dialog.edit_range(0, RangeField::CepFinal, "2000");

        assert_eq!(dialog.save().await, SaveStatus::Failed);

        let writes = backend.writes();
        assert_eq!(writes.len(), 1);
        assert!(matches!(&writes[0], Call::Insert { table, .. } if table == UNIT_TABLE));
        assert!(dialog.is_open());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        let seen = notifier.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NotificationLevel::Error);
        assert_eq!(seen[0].title, "Erro");
        assert_eq!(seen[0].description, SAVE_FAILED);
    }

    #[tokio::test]
    async fn test_excluded_write_failure_keeps_dialog_open_until_retry() {
        let backend = RecordingBackend::new();
        backend.fail_on(EXCLUDED_TABLE);
        let notifier = RecordingNotifier::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut dialog = UnitDialog::new(backend.clone(), notifier.clone()).on_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dialog.open(None).await;
        dialog.add_range();
        dialog.edit_range(0, RangeField::CepInicial, "1000");
        dialog.edit_range(0, RangeField::CepFinal, "2000");
        dialog.add_range();
        dialog.edit_range(1, RangeField::CepBase, "1500");
        dialog.edit_range(1, RangeField::FaixaExcluida, "1");

        assert_eq!(dialog.save().await, SaveStatus::Failed);

        let writes = backend.writes();
        assert_eq!(writes.len(), 3);
        assert!(matches!(&writes[0], Call::Insert { table, .. } if table == UNIT_TABLE));
        assert!(matches!(&writes[1], Call::Insert { table, .. } if table == SERVED_TABLE));
        assert!(matches!(&writes[2], Call::Insert { table, .. } if table == EXCLUDED_TABLE));
        assert!(dialog.is_open());
        assert_eq!(dialog.ranges().len(), 2);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        let seen = notifier.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NotificationLevel::Error);
        assert_eq!(seen[0].title, "Erro");
        assert_eq!(seen[0].description, SAVE_FAILED);

        backend.heal(EXCLUDED_TABLE);
        assert_eq!(dialog.save().await, SaveStatus::Saved);

        assert!(!dialog.is_open());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        let seen = notifier.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].level, NotificationLevel::Success);
        assert!(matches!(
            backend.writes().last(),
            Some(Call::Insert { table, .. }) if table == EXCLUDED_TABLE
        ));
    }

    #[tokio::test]
    async fn test_load_failure_leaves_list_empty() {
        let backend = seeded_backend();
        backend.fail_on(EXCLUDED_TABLE);
        let mut dialog = UnitDialog::new(backend, RecordingNotifier::default());

        dialog.open(Some(existing_unit())).await;

        assert!(dialog.is_open());
        assert!(dialog.ranges().is_empty());
    }

    #[tokio::test]
    async fn test_update_reloads_canonical_ranges() {
        let backend = seeded_backend();
        let notifier = RecordingNotifier::default();
        let mut dialog = UnitDialog::new(backend.clone(), notifier.clone());
        dialog.open(Some(existing_unit())).await;

        dialog.set_field(UnitField::Telefone, FieldValue::Text("81 3333-0000".to_string()));
        assert_eq!(dialog.save().await, SaveStatus::Saved);

        let writes = backend.writes();
        match &writes[0] {
            Call::Update { table, id, row } => {
                assert_eq!(table, UNIT_TABLE);
                assert_eq!(*id, 42);
                assert_eq!(row["telefone"], json!("81 3333-0000"));
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(notifier.seen()[0].description, UNIT_UPDATED);
        assert_eq!(dialog.ranges().len(), 2);
        let selects = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Select { .. }))
            .count();
        assert_eq!(selects, 4);
    }

    #[tokio::test]
    async fn test_reopen_new_starts_from_defaults() {
        let backend = seeded_backend();
        let defaults = Unit {
            estado: "PE".to_string(),
            mostra_precos_unidades: false,
            ..Unit::default()
        };
        let mut dialog = UnitDialog::new(backend, RecordingNotifier::default())
            .with_defaults(defaults.clone());
        dialog.open(Some(existing_unit())).await;
        dialog.close();

        dialog.open(None).await;

        assert!(dialog.ranges().is_empty());
        assert_eq!(dialog.title(), "Nova Unidade");
        assert_eq!(dialog.draft(), &defaults);
    }

    #[tokio::test]
    async fn test_blocked_ceps_are_read_but_never_written() {
        let backend = seeded_backend();
        backend.seed_rows(
            crate::domain::ports::BLOCKED_TABLE,
            vec![json!({"id": 1, "unit_id": 42, "cep": "01310100"})],
        );
        let mut dialog = UnitDialog::new(backend.clone(), RecordingNotifier::default());
        dialog.open(Some(existing_unit())).await;

        dialog.refresh_blocked_ceps().await;
        assert_eq!(dialog.blocked_ceps(), ["01310100".to_string()]);
        assert!(!dialog.add_blocked_cep("0131"));
        assert!(dialog.add_blocked_cep("22041001"));

        dialog.save().await;
        assert!(backend
            .writes()
            .iter()
            .all(|c| !matches!(c, Call::Insert { table, .. } if table == crate::domain::ports::BLOCKED_TABLE)));
    }
}
