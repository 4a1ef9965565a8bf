use crate::core::ranges::CepRangeList;
use crate::domain::cep::{normalize, resolve_enclosing, CEP_LEN, SEGMENT_LEN};
use crate::domain::model::{
    BlockedCepRow, CepRangeEntry, ExcludedRangeRow, RangeKind, ServedRange, ServedRangeRow, Unit,
};
use crate::domain::ports::{Backend, BLOCKED_TABLE, EXCLUDED_TABLE, SERVED_TABLE, UNIT_TABLE};
use crate::utils::error::{Result, UnitError};
use serde_json::Value;

const SERVED_COLUMNS: &str = "id,cep_inicial,cep_final,unidade_id";
const EXCLUDED_COLUMNS: &str = "id,cep_base,faixa_excluida,unidade_id";

/// What a completed save wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub unit_id: i64,
    pub created: bool,
    pub served_written: usize,
    pub excluded_written: usize,
    /// Excluded segments with no enclosing served range; not persisted.
    pub skipped: Vec<CepRangeEntry>,
}

/// Reads and writes a unit and its CEP ranges across the backend tables.
///
/// Writes are sequential and non-transactional: a failure stops the pipeline
/// and whatever was already written stays written.
pub struct PersistenceGateway<B: Backend> {
    backend: B,
}

impl<B: Backend> PersistenceGateway<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn load_unit(&self, unit_id: i64) -> Result<Option<Unit>> {
        let rows = self
            .backend
            .select(UNIT_TABLE, "*", &[("id", unit_id.to_string())])
            .await?;
        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row).map_err(UnitError::from))
            .transpose()
    }

    /// Served ranges first, then excluded segments, each tagged by kind.
    pub async fn load_ranges(&self, unit_id: i64) -> Result<Vec<CepRangeEntry>> {
        tracing::debug!(unit_id, "loading CEP ranges");
        let filter = [("unidade_id", unit_id.to_string())];

        let served = self
            .backend
            .select(SERVED_TABLE, SERVED_COLUMNS, &filter)
            .await?;
        let excluded = self
            .backend
            .select(EXCLUDED_TABLE, EXCLUDED_COLUMNS, &filter)
            .await?;

        let mut entries = Vec::with_capacity(served.len() + excluded.len());
        for row in served {
            let row: ServedRangeRow = serde_json::from_value(row)?;
            entries.push(CepRangeEntry {
                id: row.id,
                kind: RangeKind::Served,
                cep_inicial: row.cep_inicial,
                cep_final: row.cep_final,
                ..CepRangeEntry::default()
            });
        }
        for row in excluded {
            let row: ExcludedRangeRow = serde_json::from_value(row)?;
            entries.push(CepRangeEntry {
                id: row.id,
                kind: RangeKind::Excluded,
                cep_base: row.cep_base,
                faixa_excluida: row.faixa_excluida,
                ..CepRangeEntry::default()
            });
        }

        tracing::debug!(unit_id, count = entries.len(), "CEP ranges loaded");
        Ok(entries)
    }

    pub async fn load_blocked_ceps(&self, unit_id: i64) -> Result<Vec<String>> {
        let rows = self
            .backend
            .select(BLOCKED_TABLE, "*", &[("unit_id", unit_id.to_string())])
            .await?;
        rows.into_iter()
            .map(|row| -> Result<String> { Ok(serde_json::from_value::<BlockedCepRow>(row)?.cep) })
            .collect()
    }

    /// Deletes the entry remotely when it has an id, then drops it locally.
    ///
    /// The id belongs to the table the entry was loaded from; the shape only
    /// decides for untagged entries. On a failed delete the entry stays in
    /// the list.
    pub async fn remove_range(
        &self,
        list: &mut CepRangeList,
        index: usize,
    ) -> Result<CepRangeEntry> {
        let entry = list
            .get(index)
            .ok_or_else(|| UnitError::validation(format!("no CEP range at position {}", index)))?;

        if let Some(id) = entry.id {
            let table = match entry.kind {
                RangeKind::Served => Some(SERVED_TABLE),
                RangeKind::Excluded => Some(EXCLUDED_TABLE),
                RangeKind::New if entry.is_served() => Some(SERVED_TABLE),
                RangeKind::New if entry.is_excluded() => Some(EXCLUDED_TABLE),
                RangeKind::New => None,
            };

            if let Some(table) = table {
                if let Err(e) = self.backend.delete(table, id).await {
                    tracing::error!(table, id, error = %e, "failed to delete CEP range");
                    return Err(e);
                }
                tracing::info!(table, id, "CEP range deleted");
            }
        }

        list.remove(index)
    }

    /// Unit row, then served ranges, then excluded segments.
    pub async fn save(&self, unit: &Unit, list: &mut CepRangeList) -> Result<SaveOutcome> {
        let created = unit.is_new();
        let unit_id = self.write_unit(unit).await?;

        let served = self.write_served(unit_id, list).await?;
        let (excluded_written, skipped) = self.write_excluded(unit_id, list, &served).await?;

        Ok(SaveOutcome {
            unit_id,
            created,
            served_written: served.len(),
            excluded_written,
            skipped,
        })
    }

    async fn write_unit(&self, unit: &Unit) -> Result<i64> {
        let row = serde_json::to_value(unit.to_row())?;
        if unit.is_new() {
            let created = self.backend.insert(UNIT_TABLE, row).await?;
            let id = generated_id(UNIT_TABLE, &created)?;
            tracing::info!(unit_id = id, "unit created");
            Ok(id)
        } else {
            self.backend.update(UNIT_TABLE, unit.id, row).await?;
            tracing::info!(unit_id = unit.id, "unit updated");
            Ok(unit.id)
        }
    }

    async fn write_served(&self, unit_id: i64, list: &mut CepRangeList) -> Result<Vec<ServedRange>> {
        let mut written = Vec::new();

        for entry in list.entries_mut().iter_mut().filter(|e| e.is_served()) {
            let row = ServedRangeRow {
                id: None,
                unidade_id: unit_id,
                cep_inicial: normalize(&entry.cep_inicial, CEP_LEN),
                cep_final: normalize(&entry.cep_final, CEP_LEN),
            };

            let id = match entry.served_id() {
                Some(id) => {
                    self.backend
                        .update(SERVED_TABLE, id, serde_json::to_value(&row)?)
                        .await
                        .inspect_err(|e| {
                            tracing::error!(id, error = %e, "failed to update served range")
                        })?;
                    id
                }
                None => {
                    let created = self
                        .backend
                        .insert(SERVED_TABLE, serde_json::to_value(&row)?)
                        .await
                        .inspect_err(|e| tracing::error!(error = %e, "failed to insert served range"))?;
                    let id = generated_id(SERVED_TABLE, &created)?;
                    if entry.kind == RangeKind::New {
                        entry.id = Some(id);
                        entry.kind = RangeKind::Served;
                    }
                    id
                }
            };

            tracing::debug!(
                id,
                cep_inicial = %row.cep_inicial,
                cep_final = %row.cep_final,
                "served range written"
            );
            written.push(ServedRange {
                id: Some(id),
                cep_inicial: row.cep_inicial,
                cep_final: row.cep_final,
            });
        }

        Ok(written)
    }

    async fn write_excluded(
        &self,
        unit_id: i64,
        list: &CepRangeList,
        served: &[ServedRange],
    ) -> Result<(usize, Vec<CepRangeEntry>)> {
        let mut written = 0;
        let mut skipped = Vec::new();

        for entry in list.entries().iter().filter(|e| e.is_excluded()) {
            let cep_base = normalize(&entry.cep_base, CEP_LEN);
            let faixa_excluida = normalize(&entry.faixa_excluida, SEGMENT_LEN);

            let Some(cep_atende_id) = resolve_enclosing(served, &cep_base) else {
                tracing::warn!(
                    cep_base = %cep_base,
                    faixa_excluida = %faixa_excluida,
                    "no served range encloses excluded segment, skipping"
                );
                skipped.push(entry.clone());
                continue;
            };

            let row = serde_json::to_value(ExcludedRangeRow {
                id: None,
                unidade_id: unit_id,
                cep_base,
                faixa_excluida,
                cep_atende_id: Some(cep_atende_id),
            })?;

            match entry.excluded_id() {
                Some(id) => self
                    .backend
                    .update(EXCLUDED_TABLE, id, row)
                    .await
                    .inspect_err(|e| {
                        tracing::error!(id, error = %e, "failed to update excluded segment")
                    })?,
                None => {
                    self.backend
                        .insert(EXCLUDED_TABLE, row)
                        .await
                        .inspect_err(|e| {
                            tracing::error!(error = %e, "failed to insert excluded segment")
                        })?;
                }
            }
            written += 1;
        }

        Ok((written, skipped))
    }
}

fn generated_id(table: &str, created: &Value) -> Result<i64> {
    created
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| UnitError::MissingGeneratedId {
            table: table.to_string(),
        })
}
