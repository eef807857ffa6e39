//! crates/campus_core/src/validation.rs
//!
//! Form checks performed before a request is forwarded to a backend service.
//! Each validator collects every problem instead of stopping at the first one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::availability::parse_clock;
use crate::domain::{Coordinates, NewComment, NewLocation, NewReservation, NewTicket, NewUser};

const MIN_PASSWORD_LEN: usize = 6;
const MAX_GRACE_PERIOD_MINUTES: u32 = 120;
const TICKET_TITLE_LEN: std::ops::RangeInclusive<usize> = 5..=200;
const KNOWN_ROLES: [&str; 3] = ["admin", "teacher", "student"];

/// Field name to the list of problems found in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "El correo es obligatorio");
    } else if !email_pattern().is_match(email) {
        errors.add("email", "El correo no tiene un formato válido");
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.add("password", "La contraseña es obligatoria");
    }
    errors.into_result()
}

pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, &user.email);
    if user.full_name.trim().is_empty() {
        errors.add("full_name", "El nombre es obligatorio");
    }
    if user.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"),
        );
    }
    if !KNOWN_ROLES.contains(&user.role.as_str()) {
        errors.add("role", format!("Rol desconocido: {}", user.role));
    }
    errors.into_result()
}

pub fn validate_reservation(reservation: &NewReservation) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if NaiveDate::parse_from_str(&reservation.fecha, "%Y-%m-%d").is_err() {
        errors.add("fecha", "La fecha debe tener el formato AAAA-MM-DD");
    }
    match (
        parse_clock(&reservation.hora_inicio),
        parse_clock(&reservation.hora_fin),
    ) {
        (Some(start), Some(end)) if start >= end => {
            errors.add("hora_fin", "La hora de fin debe ser posterior a la de inicio");
        }
        (Some(_), Some(_)) => {}
        (start, end) => {
            if start.is_none() {
                errors.add("hora_inicio", "Hora inválida, se espera HH:MM");
            }
            if end.is_none() {
                errors.add("hora_fin", "Hora inválida, se espera HH:MM");
            }
        }
    }
    if reservation.num_asistentes == 0 {
        errors.add("num_asistentes", "Debe haber al menos un asistente");
    }
    errors.into_result()
}

pub fn validate_ticket(ticket: &NewTicket) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let title_len = ticket.titulo.trim().chars().count();
    if !TICKET_TITLE_LEN.contains(&title_len) {
        errors.add(
            "titulo",
            format!(
                "El título debe tener entre {} y {} caracteres",
                TICKET_TITLE_LEN.start(),
                TICKET_TITLE_LEN.end()
            ),
        );
    }
    if ticket.descripcion.trim().is_empty() {
        errors.add("descripcion", "La descripción es obligatoria");
    }
    if ticket.prioridad_codigo.trim().is_empty() {
        errors.add("prioridad_codigo", "La prioridad es obligatoria");
    }
    errors.into_result()
}

pub fn validate_location(location: &NewLocation) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if location.location_code.trim().is_empty() {
        errors.add("location_code", "El código de ubicación es obligatorio");
    }
    if Coordinates::new(location.latitude, location.longitude).is_none() {
        errors.add("coordinates", "Coordenadas fuera de rango");
    }
    if location.class_start >= location.class_end {
        errors.add("class_end", "La hora de fin debe ser posterior a la de inicio");
    }
    if location.grace_period > MAX_GRACE_PERIOD_MINUTES {
        errors.add(
            "grace_period",
            format!("El periodo de gracia no puede superar {MAX_GRACE_PERIOD_MINUTES} minutos"),
        );
    }
    errors.into_result()
}

pub fn validate_comment(comment: &NewComment) -> Result<(), ValidationErrors> {
    if comment.contenido.trim().is_empty() {
        return Err(ValidationErrors::single(
            "contenido",
            "El comentario no puede estar vacío",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn reservation(inicio: &str, fin: &str) -> NewReservation {
        NewReservation {
            recurso_id: "sala-1".to_string(),
            fecha: "2025-03-10".to_string(),
            hora_inicio: inicio.to_string(),
            hora_fin: fin.to_string(),
            usuario_id: Uuid::nil(),
            usuario_nombre: "Luis".to_string(),
            usuario_email: "luis@campus.edu".to_string(),
            motivo: None,
            num_asistentes: 2,
        }
    }

    #[test]
    fn login_requires_well_formed_email_and_password() {
        assert!(validate_login("luis@campus.edu", "pw").is_ok());

        let errors = validate_login("not-an-email", "").unwrap_err();
        assert!(errors.field("email").is_some());
        assert!(errors.field("password").is_some());

        let errors = validate_login("   ", "pw").unwrap_err();
        assert_eq!(errors.field("email").unwrap()[0], "El correo es obligatorio");
    }

    #[test]
    fn new_user_checks_every_field() {
        let user = NewUser {
            email: "x".to_string(),
            password: "123".to_string(),
            full_name: " ".to_string(),
            role: "root".to_string(),
        };
        let errors = validate_new_user(&user).unwrap_err();
        for field in ["email", "password", "full_name", "role"] {
            assert!(errors.field(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn reservation_end_must_follow_start() {
        assert!(validate_reservation(&reservation("08:00", "10:00")).is_ok());
        let errors = validate_reservation(&reservation("10:00", "10:00")).unwrap_err();
        assert!(errors.field("hora_fin").is_some());

        let errors = validate_reservation(&reservation("ocho", "10:00")).unwrap_err();
        assert!(errors.field("hora_inicio").is_some());
        assert!(errors.field("hora_fin").is_none());
    }

    #[test]
    fn reservation_needs_attendees_and_a_date() {
        let mut r = reservation("08:00", "09:00");
        r.num_asistentes = 0;
        r.fecha = "10/03/2025".to_string();
        let errors = validate_reservation(&r).unwrap_err();
        assert!(errors.field("num_asistentes").is_some());
        assert!(errors.field("fecha").is_some());
    }

    #[test]
    fn ticket_title_length_is_bounded() {
        let mut ticket = NewTicket {
            titulo: "Proyector".to_string(),
            descripcion: "No enciende".to_string(),
            prioridad_codigo: "ALTA".to_string(),
            categoria_codigo: None,
            ubicacion_codigo: None,
        };
        assert!(validate_ticket(&ticket).is_ok());
        ticket.titulo = "Foco".to_string();
        assert!(validate_ticket(&ticket).unwrap_err().field("titulo").is_some());
    }

    #[test]
    fn location_window_and_grace_are_checked() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let location = NewLocation {
            location_code: "LAB-101".to_string(),
            location_name: String::new(),
            latitude: -12.0,
            longitude: -77.0,
            class_start: start,
            class_end: start,
            grace_period: 200,
        };
        let errors = validate_location(&location).unwrap_err();
        assert!(errors.field("class_end").is_some());
        assert!(errors.field("grace_period").is_some());
        assert!(errors.field("coordinates").is_none());
    }

    #[test]
    fn display_lists_every_problem() {
        let mut errors = ValidationErrors::single("email", "bad");
        errors.add("password", "empty");
        assert_eq!(errors.to_string(), "email: bad; password: empty");
    }

    #[test]
    fn empty_comments_are_rejected() {
        let comment = NewComment {
            contenido: "  ".to_string(),
            es_interno: false,
        };
        assert!(validate_comment(&comment).is_err());
    }
}
