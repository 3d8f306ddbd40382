//! PDF exports drawn with `printpdf`.
//!
//! Layout is deliberately simple: a title, an optional block of text and a
//! bordered table that continues on new pages when it runs out of room.

use chrono::NaiveDate;
use entity::{employee, fiche_de_paie, projet};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};
use thiserror::Error;

use crate::departements::DepartementRow;
use crate::projets::display_date;
use crate::{CompanyInfo, money};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
}

impl From<printpdf::Error> for ReportError {
    fn from(err: printpdf::Error) -> Self {
        ReportError::Pdf(err.to_string())
    }
}

/// A rendered document and the filename it is served under.
#[derive(Clone, Debug)]
pub struct PdfReport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug)]
enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    fn size(self) -> (f32, f32) {
        match self {
            Orientation::Portrait => (210.0, 297.0),
            Orientation::Landscape => (297.0, 210.0),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Weight {
    Regular,
    Bold,
}

const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 8.0;
const CELL_PADDING: f32 = 2.0;
const PT_TO_MM: f32 = 0.3528;

const BLACK: (u8, u8, u8) = (0, 0, 0);
const WHITE: (u8, u8, u8) = (255, 255, 255);
const HEADER_GREY: (u8, u8, u8) = (70, 70, 70);
const LIGHT_GREY: (u8, u8, u8) = (235, 235, 235);

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

/// Rough Helvetica advance width; good enough to keep text inside its cell.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT_TO_MM
}

fn fit(text: &str, size: f32, width: f32) -> String {
    if text_width(text, size) <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().collect();
    while !out.is_empty() && text_width(&format!("{out}..."), size) > width {
        out.pop();
    }
    format!("{out}...")
}

/// Column of a table: header label and relative width.
struct Column {
    label: &'static str,
    weight: f32,
}

const fn col(label: &'static str, weight: f32) -> Column {
    Column { label, weight }
}

struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    width: f32,
    height: f32,
    /// Distance of the writing position from the bottom edge, in mm.
    cursor: f32,
}

impl Canvas {
    fn new(title: &str, orientation: Orientation) -> Result<Self, ReportError> {
        let (width, height) = orientation.size();
        let (doc, page, layer) = PdfDocument::new(title, Mm(width), Mm(height), "content");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            width,
            height,
            cursor: height - MARGIN,
        })
    }

    fn content_width(&self) -> f32 {
        self.width - 2.0 * MARGIN
    }

    fn font(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(self.width), Mm(self.height), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = self.height - MARGIN;
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.cursor - needed < MARGIN {
            self.new_page();
        }
    }

    fn text_at(&self, text: &str, size: f32, x: f32, y: f32, weight: Weight, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, Mm(x), Mm(y), self.font(weight));
    }

    /// Writes one line at the left margin and moves the cursor below it.
    fn line(&mut self, text: &str, size: f32, weight: Weight) {
        let advance = size * PT_TO_MM * 1.5;
        self.ensure_room(advance);
        self.cursor -= advance;
        let text = fit(text, size, self.content_width());
        self.text_at(&text, size, MARGIN, self.cursor, weight, BLACK);
    }

    fn centered(&mut self, text: &str, size: f32, weight: Weight) {
        let advance = size * PT_TO_MM * 1.5;
        self.ensure_room(advance);
        self.cursor -= advance;
        let x = ((self.width - text_width(text, size)) / 2.0).max(MARGIN);
        self.text_at(text, size, x, self.cursor, weight, BLACK);
    }

    fn gap(&mut self, mm: f32) {
        self.cursor -= mm;
    }

    fn rect(&self, x: f32, top: f32, w: f32, h: f32, mode: PaintMode) {
        let rect = Rect::new(Mm(x), Mm(top - h), Mm(x + w), Mm(top)).with_mode(mode);
        self.layer.add_rect(rect);
    }

    fn filled_rect(&self, x: f32, top: f32, w: f32, h: f32, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb(color));
        self.rect(x, top, w, h, PaintMode::Fill);
    }

    fn framed_rect(&self, x: f32, top: f32, w: f32, h: f32) {
        self.layer.set_outline_color(rgb(BLACK));
        self.layer.set_outline_thickness(0.5);
        self.rect(x, top, w, h, PaintMode::Stroke);
    }

    fn table_header(&mut self, columns: &[Column], widths: &[f32]) {
        let top = self.cursor;
        self.filled_rect(MARGIN, top, self.content_width(), ROW_HEIGHT, HEADER_GREY);
        let mut x = MARGIN;
        for (column, width) in columns.iter().zip(widths) {
            let label = fit(column.label, 10.0, width - 2.0 * CELL_PADDING);
            self.text_at(&label, 10.0, x + CELL_PADDING, top - ROW_HEIGHT + 2.5, Weight::Bold, WHITE);
            x += width;
        }
        self.cursor -= ROW_HEIGHT;
    }

    /// Bordered table; the header is repeated on every page it spans.
    fn table(&mut self, columns: &[Column], rows: &[Vec<String>]) {
        let total: f32 = columns.iter().map(|c| c.weight).sum();
        let widths: Vec<f32> = columns
            .iter()
            .map(|c| self.content_width() * c.weight / total)
            .collect();

        self.ensure_room(2.0 * ROW_HEIGHT);
        self.table_header(columns, &widths);
        for row in rows {
            if self.cursor - ROW_HEIGHT < MARGIN {
                self.new_page();
                self.table_header(columns, &widths);
            }
            let top = self.cursor;
            let mut x = MARGIN;
            for (cell, width) in row.iter().zip(&widths) {
                self.framed_rect(x, top, *width, ROW_HEIGHT);
                let text = fit(cell, 10.0, width - 2.0 * CELL_PADDING);
                self.text_at(&text, 10.0, x + CELL_PADDING, top - ROW_HEIGHT + 2.5, Weight::Regular, BLACK);
                x += width;
            }
            self.cursor -= ROW_HEIGHT;
        }
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        Ok(self.doc.save_to_bytes()?)
    }
}

fn listing(
    title: &str,
    orientation: Orientation,
    columns: &[Column],
    rows: &[Vec<String>],
) -> Result<Vec<u8>, ReportError> {
    let mut canvas = Canvas::new(title, orientation)?;
    canvas.centered(title, 18.0, Weight::Bold);
    canvas.gap(6.0);
    canvas.table(columns, rows);
    canvas.finish()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn employees_report(rows: &[employee::Model], today: NaiveDate) -> Result<PdfReport, ReportError> {
    let columns = [
        col("Nom", 2.0),
        col("Prénom", 2.0),
        col("Email", 3.5),
        col("Téléphone", 2.0),
        col("Poste", 2.5),
        col("Grade", 1.5),
    ];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|e| {
            vec![
                e.nom.clone(),
                e.prenom.clone(),
                e.email.clone(),
                e.telephone.clone().unwrap_or_default(),
                e.poste.clone(),
                e.grade.clone(),
            ]
        })
        .collect();
    let title = format!("Rapport: Liste des Employés au {}", iso(today));
    Ok(PdfReport {
        filename: format!("rapport_employes_{}.pdf", iso(today)),
        bytes: listing(&title, Orientation::Landscape, &columns, &cells)?,
    })
}

pub fn departements_report(rows: &[DepartementRow], today: NaiveDate) -> Result<PdfReport, ReportError> {
    let columns = [col("ID", 1.0), col("Intitulé", 4.0), col("Chef de Département", 4.0)];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|d| {
            vec![
                d.id.to_string(),
                d.intitule.clone(),
                d.chef.clone().unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    let title = format!("Rapport: Liste des Départements au {}", iso(today));
    Ok(PdfReport {
        filename: format!("rapport_departements_{}.pdf", iso(today)),
        bytes: listing(&title, Orientation::Portrait, &columns, &cells)?,
    })
}

pub fn projets_report(rows: &[projet::Model], today: NaiveDate) -> Result<PdfReport, ReportError> {
    let columns = [
        col("ID", 1.0),
        col("Nom du Projet", 5.0),
        col("Date Début", 2.0),
        col("Date Fin Prévue", 2.0),
        col("Statut", 2.0),
    ];
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.nom_projet.clone(),
                display_date(p.date_debut),
                p.date_fin_prevue.map(display_date).unwrap_or_else(|| "-".into()),
                p.etat_projet.as_str().to_string(),
            ]
        })
        .collect();
    let title = format!("Rapport: Liste des Projets en cours au {}", iso(today));
    Ok(PdfReport {
        filename: format!("rapport_projets_{}.pdf", iso(today)),
        bytes: listing(&title, Orientation::Landscape, &columns, &cells)?,
    })
}

pub fn payslip_report(
    fiche: &fiche_de_paie::Model,
    owner: Option<&employee::Model>,
    company: &CompanyInfo,
) -> Result<PdfReport, ReportError> {
    let periode = money::periode(fiche.mois, fiche.annee);
    let mut canvas = Canvas::new(&format!("Fiche de paie {periode}"), Orientation::Portrait)?;

    canvas.centered("FICHE DE PAIE", 18.0, Weight::Bold);
    canvas.centered(&format!("Période : {periode}"), 12.0, Weight::Regular);
    canvas.gap(8.0);

    // Employer and employee side by side.
    let block_top = canvas.cursor;
    let block_height = 26.0;
    let half = canvas.content_width() / 2.0;
    canvas.filled_rect(MARGIN, block_top, half, block_height, LIGHT_GREY);
    canvas.framed_rect(MARGIN, block_top, half, block_height);
    canvas.framed_rect(MARGIN + half, block_top, half, block_height);

    let inner = half - 2.0 * CELL_PADDING - 2.0;
    let left = MARGIN + CELL_PADDING + 1.0;
    canvas.text_at(&fit(&format!("Employeur : {}", company.name), 12.0, inner), 12.0, left, block_top - 7.0, Weight::Bold, BLACK);
    canvas.text_at(&fit(&company.address, 10.0, inner), 10.0, left, block_top - 13.0, Weight::Regular, BLACK);

    let right = MARGIN + half + CELL_PADDING + 1.0;
    match owner {
        Some(e) => {
            let name = format!("Employé : {} {}", e.prenom, e.nom.to_uppercase());
            canvas.text_at(&fit(&name, 12.0, inner), 12.0, right, block_top - 7.0, Weight::Bold, BLACK);
            canvas.text_at(&fit(&format!("Poste : {}", e.poste), 10.0, inner), 10.0, right, block_top - 13.0, Weight::Regular, BLACK);
            canvas.text_at(&format!("Matricule : {}", e.matricule), 10.0, right, block_top - 19.0, Weight::Regular, BLACK);
        }
        None => {
            let missing = format!("Employé : Données non disponibles (ID: {})", fiche.id_employer);
            canvas.text_at(&fit(&missing, 12.0, inner), 12.0, right, block_top - 7.0, Weight::Bold, BLACK);
        }
    }
    canvas.cursor = block_top - block_height;
    canvas.gap(10.0);

    canvas.line("Détails des Éléments de Paie :", 14.0, Weight::Bold);
    canvas.gap(4.0);
    canvas.table(
        &[col("Intitulé", 5.0), col("Montant", 2.0), col("Type", 3.0)],
        &[
            vec![
                "Salaire de Base".into(),
                money::format_euros(fiche.salaire_base_cents),
                "Gain".into(),
            ],
            vec![
                "Primes (Exceptionnel ou Objectifs)".into(),
                money::format_euros(fiche.primes_cents),
                "Gain".into(),
            ],
            vec![
                "Cotisations / Taxes (Simplifié)".into(),
                format!("-{}", money::format_euros(fiche.deductions_cents)),
                "Retenue".into(),
            ],
        ],
    );
    canvas.gap(10.0);

    let net = format!("NET À PAYER : {}", money::format_euros(fiche.net_a_payer_cents));
    let box_width = canvas.content_width() / 2.0;
    let box_x = MARGIN + box_width;
    let top = canvas.cursor;
    canvas.filled_rect(box_x, top, box_width, 12.0, LIGHT_GREY);
    canvas.framed_rect(box_x, top, box_width, 12.0);
    canvas.text_at(&fit(&net, 16.0, box_width - 4.0), 16.0, box_x + 2.0, top - 8.5, Weight::Bold, BLACK);
    canvas.cursor = top - 12.0;
    canvas.gap(10.0);

    canvas.line(
        &format!("Fiche générée automatiquement le : {}", display_date(fiche.date_generation)),
        8.0,
        Weight::Regular,
    );

    Ok(PdfReport {
        filename: format!("fiche_paie_{}.pdf", periode.replace(' ', "_")),
        bytes: canvas.finish()?,
    })
}
