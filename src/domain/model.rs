use crate::utils::error::{Result, UnitError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reads a JSON `null` as the type's default, so a null flag is unchecked.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A service location, one row of `unidade`. `id == 0` means not yet created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub nome: String,
    #[serde(deserialize_with = "null_as_default")]
    pub nome_interno: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub telefone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cep: String,
    #[serde(deserialize_with = "null_as_default")]
    pub logradouro: String,
    #[serde(deserialize_with = "null_as_default")]
    pub numero: String,
    #[serde(deserialize_with = "null_as_default")]
    pub complemento: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bairro: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cidade: String,
    #[serde(deserialize_with = "null_as_default")]
    pub estado: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub atende_aplicativo: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub mostra_precos_unidades: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub qtd_agendamento_por_faixa: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub qtd_vacinas_por_faixa: i64,
}

impl Default for Unit {
    fn default() -> Self {
        Self {
            id: 0,
            nome: String::new(),
            nome_interno: String::new(),
            email: String::new(),
            telefone: String::new(),
            cep: String::new(),
            logradouro: String::new(),
            numero: String::new(),
            complemento: String::new(),
            bairro: String::new(),
            cidade: String::new(),
            estado: String::new(),
            status: true,
            atende_aplicativo: true,
            mostra_precos_unidades: true,
            qtd_agendamento_por_faixa: 0,
            qtd_vacinas_por_faixa: 0,
        }
    }
}

impl Unit {
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn get(&self, field: UnitField) -> FieldValue {
        use UnitField::*;
        match field {
            Nome => FieldValue::Text(self.nome.clone()),
            NomeInterno => FieldValue::Text(self.nome_interno.clone()),
            Email => FieldValue::Text(self.email.clone()),
            Telefone => FieldValue::Text(self.telefone.clone()),
            Cep => FieldValue::Text(self.cep.clone()),
            Logradouro => FieldValue::Text(self.logradouro.clone()),
            Numero => FieldValue::Text(self.numero.clone()),
            Complemento => FieldValue::Text(self.complemento.clone()),
            Bairro => FieldValue::Text(self.bairro.clone()),
            Cidade => FieldValue::Text(self.cidade.clone()),
            Estado => FieldValue::Text(self.estado.clone()),
            Status => FieldValue::Flag(self.status),
            AtendeAplicativo => FieldValue::Flag(self.atende_aplicativo),
            MostraPrecosUnidades => FieldValue::Flag(self.mostra_precos_unidades),
            QtdAgendamentoPorFaixa => FieldValue::Count(self.qtd_agendamento_por_faixa),
            QtdVacinasPorFaixa => FieldValue::Count(self.qtd_vacinas_por_faixa),
        }
    }

    /// Returns a copy with exactly `field` replaced.
    pub fn with_field(&self, field: UnitField, value: FieldValue) -> Result<Unit> {
        use UnitField::*;
        let mut next = self.clone();
        match (field, value) {
            (Nome, FieldValue::Text(v)) => next.nome = v,
            (NomeInterno, FieldValue::Text(v)) => next.nome_interno = v,
            (Email, FieldValue::Text(v)) => next.email = v,
            (Telefone, FieldValue::Text(v)) => next.telefone = v,
            (Cep, FieldValue::Text(v)) => next.cep = v,
            (Logradouro, FieldValue::Text(v)) => next.logradouro = v,
            (Numero, FieldValue::Text(v)) => next.numero = v,
            (Complemento, FieldValue::Text(v)) => next.complemento = v,
            (Bairro, FieldValue::Text(v)) => next.bairro = v,
            (Cidade, FieldValue::Text(v)) => next.cidade = v,
            (Estado, FieldValue::Text(v)) => next.estado = v,
            (Status, FieldValue::Flag(v)) => next.status = v,
            (AtendeAplicativo, FieldValue::Flag(v)) => next.atende_aplicativo = v,
            (MostraPrecosUnidades, FieldValue::Flag(v)) => next.mostra_precos_unidades = v,
            (QtdAgendamentoPorFaixa, FieldValue::Count(v)) => next.qtd_agendamento_por_faixa = v,
            (QtdVacinasPorFaixa, FieldValue::Count(v)) => next.qtd_vacinas_por_faixa = v,
            (field, value) => {
                return Err(UnitError::validation(format!(
                    "field '{}' does not accept a {} value",
                    field,
                    value.kind_name()
                )))
            }
        }
        Ok(next)
    }

    pub fn to_row(&self) -> UnitRow {
        UnitRow {
            nome: self.nome.clone(),
            nome_interno: self.nome_interno.clone(),
            email: self.email.clone(),
            telefone: self.telefone.clone(),
            cep: self.cep.clone(),
            logradouro: self.logradouro.clone(),
            numero: self.numero.clone(),
            complemento: self.complemento.clone(),
            bairro: self.bairro.clone(),
            cidade: self.cidade.clone(),
            estado: self.estado.clone(),
            status: self.status,
            atende_aplicativo: self.atende_aplicativo,
            mostra_precos_unidades: self.mostra_precos_unidades,
            qtd_agendamento_por_faixa: self.qtd_agendamento_por_faixa,
            qtd_vacinas_por_faixa: self.qtd_vacinas_por_faixa,
        }
    }
}

/// Editable columns of `unidade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitField {
    Nome,
    NomeInterno,
    Email,
    Telefone,
    Cep,
    Logradouro,
    Numero,
    Complemento,
    Bairro,
    Cidade,
    Estado,
    Status,
    AtendeAplicativo,
    MostraPrecosUnidades,
    QtdAgendamentoPorFaixa,
    QtdVacinasPorFaixa,
}

impl UnitField {
    pub const ALL: [UnitField; 16] = [
        UnitField::Nome,
        UnitField::NomeInterno,
        UnitField::Email,
        UnitField::Telefone,
        UnitField::Cep,
        UnitField::Logradouro,
        UnitField::Numero,
        UnitField::Complemento,
        UnitField::Bairro,
        UnitField::Cidade,
        UnitField::Estado,
        UnitField::Status,
        UnitField::AtendeAplicativo,
        UnitField::MostraPrecosUnidades,
        UnitField::QtdAgendamentoPorFaixa,
        UnitField::QtdVacinasPorFaixa,
    ];

    pub fn column(self) -> &'static str {
        match self {
            UnitField::Nome => "nome",
            UnitField::NomeInterno => "nome_interno",
            UnitField::Email => "email",
            UnitField::Telefone => "telefone",
            UnitField::Cep => "cep",
            UnitField::Logradouro => "logradouro",
            UnitField::Numero => "numero",
            UnitField::Complemento => "complemento",
            UnitField::Bairro => "bairro",
            UnitField::Cidade => "cidade",
            UnitField::Estado => "estado",
            UnitField::Status => "status",
            UnitField::AtendeAplicativo => "atende_aplicativo",
            UnitField::MostraPrecosUnidades => "mostra_precos_unidades",
            UnitField::QtdAgendamentoPorFaixa => "qtd_agendamento_por_faixa",
            UnitField::QtdVacinasPorFaixa => "qtd_vacinas_por_faixa",
        }
    }

    pub fn is_count(self) -> bool {
        matches!(
            self,
            UnitField::QtdAgendamentoPorFaixa | UnitField::QtdVacinasPorFaixa
        )
    }
}

impl fmt::Display for UnitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for UnitField {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        UnitField::ALL
            .iter()
            .copied()
            .find(|field| field.column() == s)
            .ok_or_else(|| UnitError::validation(format!("unknown unit field '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Count(i64),
}

impl FieldValue {
    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Flag(_) => "flag",
            FieldValue::Count(_) => "count",
        }
    }
}

/// Payload written to `unidade`; the id only travels in the filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitRow {
    pub nome: String,
    pub nome_interno: String,
    pub email: String,
    pub telefone: String,
    pub cep: String,
    pub logradouro: String,
    pub numero: String,
    pub complemento: String,
    pub bairro: String,
    pub cidade: String,
    pub estado: String,
    pub status: bool,
    pub atende_aplicativo: bool,
    pub mostra_precos_unidades: bool,
    pub qtd_agendamento_por_faixa: i64,
    pub qtd_vacinas_por_faixa: i64,
}

/// Which backend table a local range entry was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    #[default]
    New,
    Served,
    Excluded,
}

/// One row of the range editor. Carries both the served-range and the
/// excluded-segment inputs; which of them are filled decides what gets saved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CepRangeEntry {
    pub id: Option<i64>,
    pub kind: RangeKind,
    pub cep_inicial: String,
    pub cep_final: String,
    pub cep_base: String,
    pub faixa_excluida: String,
}

impl CepRangeEntry {
    pub fn is_served(&self) -> bool {
        !self.cep_inicial.is_empty() && !self.cep_final.is_empty()
    }

    pub fn is_excluded(&self) -> bool {
        !self.cep_base.is_empty() && !self.faixa_excluida.is_empty()
    }

    /// Id usable against `unidade_ceps_atende`.
    pub fn served_id(&self) -> Option<i64> {
        match self.kind {
            RangeKind::Served => self.id,
            _ => None,
        }
    }

    /// Id usable against `unidade_ceps_nao_atende`.
    pub fn excluded_id(&self) -> Option<i64> {
        match self.kind {
            RangeKind::Excluded => self.id,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServedRangeRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub unidade_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cep_inicial: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cep_final: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRangeRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub unidade_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cep_base: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub faixa_excluida: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep_atende_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedCepRow {
    #[serde(default)]
    pub id: Option<i64>,
    pub unit_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cep: String,
}

/// A served range after normalization, as seen by the excluded-segment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedRange {
    pub id: Option<i64>,
    pub cep_inicial: String,
    pub cep_final: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: "Sucesso".to_string(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: "Erro".to_string(),
            description: description.into(),
        }
    }
}
