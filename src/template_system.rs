// src/template_system.rs
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::error::TemplateError;
use crate::template_processor::{LetterFields, TemplateProcessor};

pub const DEFAULT_TEMPLATE_ID: &str = "classique";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TemplateStyle {
    pub font_family: String,
    pub font_size_pt: f32,
    pub line_height: f32,
    pub color: String,
}

impl TemplateStyle {
    fn new(font_family: &str, font_size_pt: f32, line_height: f32, color: &str) -> Self {
        Self {
            font_family: font_family.to_string(),
            font_size_pt,
            line_height,
            color: color.to_string(),
        }
    }

    pub fn to_css(&self) -> String {
        format!(
            "font-family: {}; font-size: {}pt; line-height: {}; color: {};",
            self.font_family, self.font_size_pt, self.line_height, self.color
        )
    }
}

impl Default for TemplateStyle {
    fn default() -> Self {
        Self::new("Georgia, 'Times New Roman', serif", 12.0, 1.6, "#333333")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub style: TemplateStyle,
    #[serde(skip)]
    body: String,
}

/// Template content resolved against a field record
#[derive(Debug, Clone, Serialize)]
pub struct LoadedTemplate {
    pub id: String,
    pub style: TemplateStyle,
    pub html: String,
}

impl Template {
    fn new(id: &str, name: &str, description: &str, style: TemplateStyle, body: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            style,
            body: body.to_string(),
        }
    }

    pub fn render(&self, fields: &LetterFields, today: NaiveDate) -> LoadedTemplate {
        LoadedTemplate {
            id: self.id.clone(),
            style: self.style.clone(),
            html: TemplateProcessor::interpolate(&self.body, fields, today),
        }
    }
}

/// Immutable catalog of letter templates, in display order
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        let templates = builtin_templates();
        debug!("Template registry initialized with {} templates", templates.len());
        Self { templates }
    }

    pub fn list_templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get_template(&self, template_id: &str) -> Result<&Template, TemplateError> {
        self.templates
            .iter()
            .find(|t| t.id == template_id)
            .ok_or_else(|| TemplateError::NotFound(template_id.to_string()))
    }

    pub fn template_exists(&self, template_id: &str) -> bool {
        self.templates.iter().any(|t| t.id == template_id)
    }

    /// Resolve a template against the field record using today's date
    pub fn load(
        &self,
        template_id: &str,
        fields: &LetterFields,
    ) -> Result<LoadedTemplate, TemplateError> {
        let template = self.get_template(template_id)?;
        Ok(template.render(fields, Local::now().date_naive()))
    }
}

fn builtin_templates() -> Vec<Template> {
    vec![
        Template::new(
            "classique",
            "Classique",
            "Lettre sobre et formelle, adaptée aux secteurs traditionnels",
            TemplateStyle::default(),
            CLASSIQUE_BODY,
        ),
        Template::new(
            "moderne",
            "Moderne",
            "Mise en page aérée avec un titre de poste mis en avant",
            TemplateStyle::new("'Helvetica Neue', Arial, sans-serif", 11.0, 1.5, "#1f2937"),
            MODERNE_BODY,
        ),
        Template::new(
            "creatif",
            "Créatif",
            "Ton personnel et structure en points forts pour les métiers créatifs",
            TemplateStyle::new("Verdana, Geneva, sans-serif", 11.0, 1.7, "#4c1d95"),
            CREATIF_BODY,
        ),
        Template::new(
            "minimaliste",
            "Minimaliste",
            "Lettre courte et directe, l'essentiel en trois paragraphes",
            TemplateStyle::new("'Courier New', Courier, monospace", 10.5, 1.5, "#111111"),
            MINIMALISTE_BODY,
        ),
    ]
}

const CLASSIQUE_BODY: &str = r#"<p><strong>{{nom}}</strong><br>{{email}}<br>{{telephone}}</p>
<p style="text-align: right">{{ville}}, le {{date}}</p>
<p>À l'attention de {{destinataire}}<br>{{entreprise}}</p>
<p><strong>Objet : Candidature au poste de {{poste}}</strong></p>
<p>Madame, Monsieur,</p>
<p>Actuellement à la recherche de nouvelles opportunités dans le secteur {{secteur}}, je vous adresse ma candidature pour le poste de {{poste}} au sein de {{entreprise}}.</p>
<p>{{experience}}</p>
<p>{{motivation}}</p>
<p>Mes compétences en {{competences}} me permettront de contribuer rapidement à vos projets.</p>
<p>Je me tiens à votre disposition pour un entretien et vous prie d'agréer, Madame, Monsieur, l'expression de mes salutations distinguées.</p>
<p>{{nom}}</p>"#;

const MODERNE_BODY: &str = r#"<h2>{{poste}}</h2>
<p>{{nom}} · {{email}} · {{telephone}}</p>
<p>{{ville}}, le {{date}}</p>
<p>Bonjour {{destinataire}},</p>
<p>Passionné(e) par le secteur {{secteur}}, j'ai découvert avec enthousiasme votre offre pour le poste de {{poste}} chez {{entreprise}}.</p>
<h3>Mon parcours</h3>
<p>{{experience}}</p>
<h3>Pourquoi {{entreprise}}</h3>
<p>{{motivation}}</p>
<p>Compétences clés : <em>{{competences}}</em></p>
<p>Je serais ravi(e) d'échanger avec vous lors d'un entretien.</p>
<p>Bien cordialement,<br><strong>{{nom}}</strong></p>"#;

const CREATIF_BODY: &str = r#"<p style="text-align: center"><strong>{{nom}}</strong><br>{{email}} | {{telephone}}</p>
<p style="text-align: right">{{ville}}, le {{date}}</p>
<p>Chère équipe de {{entreprise}},</p>
<p>Le poste de <strong>{{poste}}</strong> a immédiatement retenu mon attention : il réunit tout ce qui m'anime dans le secteur {{secteur}}.</p>
<p>Ce que j'apporte :</p>
<ul>
<li>{{experience}}</li>
<li>Une maîtrise de {{competences}}</li>
<li>{{motivation}}</li>
</ul>
<p>J'aimerais beaucoup vous en dire plus autour d'un café, ou d'un appel si vous préférez.</p>
<p>À très bientôt,<br>{{nom}}</p>
<p><em>À l'attention de {{destinataire}}</em></p>"#;

const MINIMALISTE_BODY: &str = r#"<p>{{nom}} / {{email}} / {{telephone}} / {{ville}}, {{date}}</p>
<p>{{destinataire}}, {{entreprise}}</p>
<p>Candidature : {{poste}} ({{secteur}}).</p>
<p>{{experience}} {{competences}}.</p>
<p>{{motivation}}</p>
<p>Cordialement,<br>{{nom}}</p>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_fields() -> LetterFields {
        LetterFields {
            poste: Some("Développeuse Rust".to_string()),
            entreprise: Some("Ferris SA".to_string()),
            secteur: Some("logiciel".to_string()),
            experience: Some("Cinq ans de développement backend.".to_string()),
            motivation: Some("Votre culture d'ingénierie me correspond.".to_string()),
            competences: Some("Rust, SQL et tests".to_string()),
            nom: Some("Camille Martin".to_string()),
            email: Some("camille@example.com".to_string()),
            telephone: Some("06 12 34 56 78".to_string()),
            ville: Some("Lyon".to_string()),
            destinataire: Some("Mme Durand".to_string()),
        }
    }

    #[test]
    fn test_listing_is_ordered_and_stable() {
        let registry = TemplateRegistry::new();
        let ids: Vec<_> = registry.list_templates().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["classique", "moderne", "creatif", "minimaliste"]);
        assert!(registry.template_exists(DEFAULT_TEMPLATE_ID));
        assert!(!registry.template_exists("baroque"));
    }

    #[test]
    fn test_unknown_template_is_not_found() {
        let registry = TemplateRegistry::new();
        assert_eq!(
            registry.get_template("baroque").unwrap_err(),
            TemplateError::NotFound("baroque".to_string())
        );
    }

    #[test]
    fn test_complete_fields_leave_no_placeholder() {
        let registry = TemplateRegistry::new();
        let fields = complete_fields();

        for template in registry.list_templates() {
            let loaded = registry.load(&template.id, &fields).unwrap();
            assert!(!loaded.style.font_family.is_empty());
            assert!(loaded.style.font_size_pt > 0.0);
            assert!(!loaded.style.to_css().is_empty());
            assert!(!loaded.html.contains("{{"), "{} has a raw token", template.id);
            assert!(!loaded.html.contains('['), "{} has a placeholder", template.id);
            assert!(loaded.html.contains("Ferris SA"));
        }
    }

    #[test]
    fn test_empty_fields_show_placeholders() {
        let registry = TemplateRegistry::new();
        let loaded = registry.load("classique", &LetterFields::default()).unwrap();
        assert!(loaded.html.contains("[Intitulé du poste]"));
        assert!(loaded.html.contains("[Votre Nom]"));
    }
}
