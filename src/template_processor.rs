// src/template_processor.rs
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::escape_html;

/// Form data interpolated into letter templates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LetterFields {
    #[serde(default)]
    pub poste: Option<String>,
    #[serde(default)]
    pub entreprise: Option<String>,
    #[serde(default)]
    pub secteur: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub competences: Option<String>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub destinataire: Option<String>,
}

impl LetterFields {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "poste" => &self.poste,
            "entreprise" => &self.entreprise,
            "secteur" => &self.secteur,
            "experience" => &self.experience,
            "motivation" => &self.motivation,
            "competences" => &self.competences,
            "nom" => &self.nom,
            "email" => &self.email,
            "telephone" => &self.telephone,
            "ville" => &self.ville,
            "destinataire" => &self.destinataire,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Set a field by key; returns false for unknown keys
    pub fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "poste" => &mut self.poste,
            "entreprise" => &mut self.entreprise,
            "secteur" => &mut self.secteur,
            "experience" => &mut self.experience,
            "motivation" => &mut self.motivation,
            "competences" => &mut self.competences,
            "nom" => &mut self.nom,
            "email" => &mut self.email,
            "telephone" => &mut self.telephone,
            "ville" => &mut self.ville,
            "destinataire" => &mut self.destinataire,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

fn placeholder(key: &str) -> Option<&'static str> {
    Some(match key {
        "poste" => "[Intitulé du poste]",
        "entreprise" => "[Nom de l'entreprise]",
        "secteur" => "[Secteur d'activité]",
        "experience" => "[Votre expérience]",
        "motivation" => "[Vos motivations]",
        "competences" => "[Vos compétences clés]",
        "nom" => "[Votre Nom]",
        "email" => "[Votre email]",
        "telephone" => "[Votre téléphone]",
        "ville" => "[Ville]",
        "destinataire" => "[Nom du recruteur]",
        _ => return None,
    })
}

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

pub fn format_date_fr(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_FR[date.month0() as usize],
        date.year()
    )
}

pub struct TemplateProcessor;

impl TemplateProcessor {
    pub fn process_variables(content: &str, vars: &HashMap<String, String>) -> String {
        vars.iter().fold(content.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{}}}}}", key), value)
        })
    }

    /// Replace every `{{key}}` token with the escaped field value, or its bracketed
    /// placeholder when the field is missing. Unknown tokens are left untouched.
    pub fn interpolate(body: &str, fields: &LetterFields, today: NaiveDate) -> String {
        let mut output = String::with_capacity(body.len());
        let mut rest = body;

        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            let Some(end) = after_open.find("}}") else {
                output.push_str(&rest[start..]);
                return output;
            };

            let key = after_open[..end].trim();
            match (key, fields.get(key), placeholder(key)) {
                ("date", _, _) => output.push_str(&format_date_fr(today)),
                (_, Some(value), _) => output.push_str(&escape_html(value)),
                (_, None, Some(fallback)) => output.push_str(fallback),
                (_, None, None) => output.push_str(&rest[start..start + 2 + end + 2]),
            }

            rest = &after_open[end + 2..];
        }

        output.push_str(rest);
        output
    }
}
