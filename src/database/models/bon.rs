use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{lenient, Intervention, InterventionInput, Observation, ObservationInput};
use crate::types::validation_label;

/// A work order ("bon de travail") as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Bon {
    pub id: i64,
    pub numero_bon: i64,
    pub affaire: Option<String>,
    pub client: Option<String>,
    pub designation_travaux: Option<String>,
    pub date_recu: Option<String>,
    pub heure_total: Option<String>,
    pub facturation: Option<String>,
    pub adresse: Option<String>,
    pub est_valide: bool,
    pub cree_par_formulaire: bool,
    pub is_synced: bool,
}

/// Who worked on a bon and when, as shown in the bons table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InterventionBrief {
    pub du: Option<String>,
    pub au: Option<String>,
    pub matricule: Option<String>,
    pub prenoms: Option<String>,
    pub binome: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BonSummary {
    pub id: i64,
    pub numero_bon: i64,
    pub affaire: Option<String>,
    pub client: Option<String>,
    pub designation_travaux: Option<String>,
    pub date_recu: Option<String>,
    pub heure_total: Option<String>,
    pub facturation: Option<String>,
    pub adresse: Option<String>,
    pub est_valide: bool,
    pub interventions: Vec<InterventionBrief>,
}

impl From<Bon> for BonSummary {
    fn from(bon: Bon) -> Self {
        Self {
            id: bon.id,
            numero_bon: bon.numero_bon,
            affaire: bon.affaire,
            client: bon.client,
            designation_travaux: bon.designation_travaux,
            date_recu: bon.date_recu,
            heure_total: bon.heure_total,
            facturation: bon.facturation,
            adresse: bon.adresse,
            est_valide: bon.est_valide,
            interventions: Vec::new(),
        }
    }
}

/// A bon with everything recorded against it
#[derive(Debug, Clone, Serialize)]
pub struct BonDetail {
    #[serde(flatten)]
    pub bon: Bon,
    pub interventions: Vec<Intervention>,
    pub observations: Vec<Observation>,
}

/// Create/update body. On update, absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BonInput {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub numero_bon: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub affaire: Option<String>,
    pub client: Option<String>,
    pub designation_travaux: Option<String>,
    pub date_recu: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub heure_total: Option<String>,
    pub facturation: Option<String>,
    pub adresse: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub est_valide: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub cree_par_formulaire: Option<bool>,
}

impl BonInput {
    pub fn is_empty(&self) -> bool {
        self.numero_bon.is_none()
            && self.affaire.is_none()
            && self.client.is_none()
            && self.designation_travaux.is_none()
            && self.date_recu.is_none()
            && self.heure_total.is_none()
            && self.facturation.is_none()
            && self.adresse.is_none()
            && self.est_valide.is_none()
            && self.cree_par_formulaire.is_none()
    }
}

/// A bon as uploaded by the mobile application, with what was recorded
/// against it in the field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldBon {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub bon: BonInput,
    #[serde(default)]
    pub interventions: Option<Vec<InterventionInput>>,
    #[serde(default)]
    pub observations: Option<Vec<ObservationInput>>,
}

/// One line of the work-order export: a bon crossed with one intervention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonExportRow {
    pub numero_bon: i64,
    pub affaire: Option<String>,
    pub facturation: Option<String>,
    pub du: Option<String>,
    pub au: Option<String>,
    pub matricule: Option<String>,
    pub prenoms: Option<String>,
    pub binome: Option<String>,
    pub client: Option<String>,
    pub designation: Option<String>,
    pub date_recu: Option<String>,
    pub heure_total: Option<String>,
    pub statut: &'static str,
}

impl BonExportRow {
    fn new(bon: &BonSummary, intervention: Option<&InterventionBrief>) -> Self {
        Self {
            numero_bon: bon.numero_bon,
            affaire: bon.affaire.clone(),
            facturation: bon.facturation.clone(),
            du: intervention.and_then(|i| i.du.clone()),
            au: intervention.and_then(|i| i.au.clone()),
            matricule: intervention.and_then(|i| i.matricule.clone()),
            prenoms: intervention.and_then(|i| i.prenoms.clone()),
            binome: intervention.and_then(|i| i.binome.clone()),
            client: bon.client.clone(),
            designation: bon.designation_travaux.clone(),
            date_recu: bon.date_recu.clone(),
            heure_total: bon.heure_total.clone(),
            statut: validation_label(bon.est_valide),
        }
    }
}

/// Flattens bons into export rows, one per intervention. A bon without
/// interventions still gets a single row so it appears in the document.
pub fn export_rows(bons: &[BonSummary]) -> Vec<BonExportRow> {
    bons.iter()
        .flat_map(|bon| {
            if bon.interventions.is_empty() {
                vec![BonExportRow::new(bon, None)]
            } else {
                bon.interventions
                    .iter()
                    .map(|i| BonExportRow::new(bon, Some(i)))
                    .collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(numero: i64, valid: bool, interventions: Vec<InterventionBrief>) -> BonSummary {
        BonSummary {
            id: numero,
            numero_bon: numero,
            affaire: Some("AF-1".into()),
            client: Some("ACME".into()),
            designation_travaux: Some("Maintenance clim".into()),
            date_recu: Some("2024-03-01".into()),
            heure_total: Some("8".into()),
            facturation: Some("Oui".into()),
            adresse: None,
            est_valide: valid,
            interventions,
        }
    }

    fn brief(matricule: &str) -> InterventionBrief {
        InterventionBrief {
            du: Some("2024-03-02".into()),
            au: Some("2024-03-02".into()),
            matricule: Some(matricule.into()),
            prenoms: Some("Jean".into()),
            binome: None,
        }
    }

    #[test]
    fn one_row_per_intervention() {
        let bons = vec![summary(12, true, vec![brief("T01"), brief("T02")])];
        let rows = export_rows(&bons);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].matricule.as_deref(), Some("T01"));
        assert_eq!(rows[1].matricule.as_deref(), Some("T02"));
        assert!(rows.iter().all(|r| r.statut == "Validé" && r.numero_bon == 12));
    }

    #[test]
    fn field_bon_reads_nested_records() {
        let bon: FieldBon = serde_json::from_str(
            r#"{
                "id": "5",
                "numero_bon": 77,
                "client": "CIE",
                "est_valide": 0,
                "interventions": [{"matricule": 12, "du": "2024-05-01"}],
                "observations": null
            }"#,
        )
        .unwrap();
        assert_eq!(bon.id, Some(5));
        assert_eq!(bon.bon.numero_bon, Some(77));
        assert_eq!(bon.bon.est_valide, Some(false));
        let interventions = bon.interventions.unwrap();
        assert_eq!(interventions[0].matricule.as_deref(), Some("12"));
        assert!(bon.observations.is_none());
    }

    #[test]
    fn bon_without_intervention_is_kept() {
        let rows = export_rows(&[summary(7, false, vec![])]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].statut, "Non validé");
        assert!(rows[0].matricule.is_none());
    }
}
