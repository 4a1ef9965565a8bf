use crate::domain::cep::{sanitize, CEP_LEN, FULL_CEP_LEN, SEGMENT_LEN};
use crate::domain::model::CepRangeEntry;
use crate::utils::error::{Result, UnitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    CepInicial,
    CepFinal,
    CepBase,
    FaixaExcluida,
}

impl RangeField {
    pub fn max_len(self) -> usize {
        match self {
            RangeField::FaixaExcluida => SEGMENT_LEN,
            _ => CEP_LEN,
        }
    }
}

/// Editable list of served ranges and excluded segments.
#[derive(Debug, Clone, Default)]
pub struct CepRangeList {
    entries: Vec<CepRangeEntry>,
}

impl CepRangeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CepRangeEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [CepRangeEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CepRangeEntry> {
        self.entries.get(index)
    }

    pub fn add_empty(&mut self) {
        self.entries.push(CepRangeEntry::default());
    }

    /// Stores `raw` as digits only, capped at the field's length.
    pub fn edit(&mut self, index: usize, field: RangeField, raw: &str) -> Result<()> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| out_of_range(index))?;
        let value = sanitize(raw, field.max_len());
        match field {
            RangeField::CepInicial => entry.cep_inicial = value,
            RangeField::CepFinal => entry.cep_final = value,
            RangeField::CepBase => entry.cep_base = value,
            RangeField::FaixaExcluida => entry.faixa_excluida = value,
        }
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<CepRangeEntry> {
        if index >= self.entries.len() {
            return Err(out_of_range(index));
        }
        Ok(self.entries.remove(index))
    }

    pub fn replace_all(&mut self, entries: Vec<CepRangeEntry>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn out_of_range(index: usize) -> UnitError {
    UnitError::validation(format!("no CEP range at position {}", index))
}

/// Single full CEPs excluded outright. Kept in memory only: nothing saves it.
#[derive(Debug, Clone, Default)]
pub struct BlockedCepList {
    ceps: Vec<String>,
}

impl BlockedCepList {
    pub fn ceps(&self) -> &[String] {
        &self.ceps
    }

    /// Accepts exactly eight characters; anything else is ignored.
    pub fn add(&mut self, cep: &str) -> bool {
        if cep.chars().count() != FULL_CEP_LEN {
            return false;
        }
        self.ceps.push(cep.to_string());
        true
    }

    /// Drops every occurrence of `cep`.
    pub fn remove(&mut self, cep: &str) {
        self.ceps.retain(|c| c != cep);
    }

    pub fn replace_all(&mut self, ceps: Vec<String>) {
        self.ceps = ceps;
    }
}
