pub mod category;
pub mod event;
pub mod images;
pub mod service;

use validator::{Validate, ValidationErrors};

use crate::errors::{ClientError, FieldError, Result};

pub use category::{CategoryForm, CategoryPayload};
pub use event::{EventForm, EventPayload};
pub use images::{stage_images, ImageRef, LocalImage};
pub use service::{ServiceForm, ServicePayload};

/// A form split into wizard steps, each listing the fields it owns.
pub trait StepForm: Validate {
    const STEPS: &'static [&'static [&'static str]];

    /// Rules that span fields or depend on edit state.
    fn cross_checks(&self) -> Vec<FieldError> {
        Vec::new()
    }
}

pub(crate) fn to_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, list) in errors.field_errors() {
        for err in list.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid", field));
            out.push(FieldError {
                field: field.to_string(),
                message,
            });
        }
    }
    out
}

/// All field errors, ordered by where the fields appear in the wizard.
pub fn collect_errors<F: StepForm>(form: &F) -> Vec<FieldError> {
    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => to_field_errors(&e),
    };
    errors.extend(form.cross_checks());

    let position = |field: &str| {
        F::STEPS
            .iter()
            .flat_map(|step| step.iter())
            .position(|f| *f == field)
            .unwrap_or(usize::MAX)
    };
    errors.sort_by(|a, b| {
        position(&a.field)
            .cmp(&position(&b.field))
            .then_with(|| a.message.cmp(&b.message))
    });
    errors
}

/// Multi-step authoring flow over one form.
#[derive(Debug)]
pub struct Wizard<F: StepForm> {
    form: F,
    step: usize,
    errors: Vec<FieldError>,
}

impl<F: StepForm> Wizard<F> {
    pub fn new(form: F) -> Self {
        Self {
            form,
            step: 0,
            errors: Vec::new(),
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn step_count(&self) -> usize {
        F::STEPS.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.step + 1 >= F::STEPS.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Validates only the current step's fields and advances when they pass.
    pub fn next(&mut self) -> Result<usize> {
        let fields = F::STEPS.get(self.step).copied().unwrap_or(&[]);
        self.errors = collect_errors(&self.form)
            .into_iter()
            .filter(|e| fields.contains(&e.field.as_str()))
            .collect();

        if !self.errors.is_empty() {
            return Err(ClientError::Form(self.errors.clone()));
        }
        if !self.is_last_step() {
            self.step += 1;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> usize {
        self.step = self.step.saturating_sub(1);
        self.errors.clear();
        self.step
    }

    /// Validates every field. On failure the wizard jumps to the first step
    /// holding an error.
    pub fn submit(&mut self) -> Result<&F> {
        self.errors = collect_errors(&self.form);
        if let Some(first) = self.errors.first() {
            if let Some(step) = F::STEPS
                .iter()
                .position(|fields| fields.contains(&first.field.as_str()))
            {
                self.step = step;
            }
            return Err(ClientError::Form(self.errors.clone()));
        }
        Ok(&self.form)
    }

    pub fn into_form(self) -> F {
        self.form
    }
}

/// Fields frozen once something has been sold against the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditLocks {
    pub schedule_locked: bool,
    pub price_locked: bool,
    /// Quantity may not go below this; it is a floor, not a lock.
    pub min_quantity: u32,
}

impl EditLocks {
    pub fn for_sold(sold: u32) -> Self {
        Self {
            schedule_locked: sold > 0,
            price_locked: sold > 0,
            min_quantity: sold,
        }
    }

    pub fn is_locked(&self, field: &str) -> bool {
        match field {
            "dates" | "start_time" | "end_time" => self.schedule_locked,
            "price" => self.price_locked,
            _ => false,
        }
    }
}

pub(crate) fn locked_error(field: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: "This can no longer be changed because sales have been made".to_string(),
    }
}

pub(crate) fn required(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("required"));
    }
    Ok(())
}
