use crate::error::ValidationError;
use crate::model::{Entity, EntityKind, FieldKind, FieldSpec};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: i64 },
}

/// Text buffers behind a create/edit form. Entity-agnostic so the UI can draw and
/// drive it through a trait object.
#[derive(Clone, Debug)]
pub struct FormState {
    pub kind: EntityKind,
    pub mode: FormMode,
    pub fields: Vec<FieldSpec>,
    pub values: Vec<String>,
    dirty: Vec<bool>,
    pub focus: usize,
    /// Inline error from local validation or the last failed submit.
    pub error: Option<String>,
    /// Sequence number of the in-flight submit, if any.
    pub submitting: Option<u64>,
}

impl FormState {
    fn new(kind: EntityKind, mode: FormMode, fields: Vec<FieldSpec>, values: Vec<String>) -> Self {
        let n = fields.len();
        Self {
            kind,
            mode,
            fields,
            values,
            dirty: vec![false; n],
            focus: 0,
            error: None,
            submitting: None,
        }
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Create => format!("New {}", self.kind.singular()),
            FormMode::Edit { id } => format!("Edit {} #{id}", self.kind.singular()),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_some()
    }

    pub fn focused(&self) -> Option<&FieldSpec> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn is_dirty(&self, idx: usize) -> bool {
        self.dirty.get(idx).copied().unwrap_or(false)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().filter(|d| **d).count()
    }

    fn touch(&mut self) {
        if let Some(d) = self.dirty.get_mut(self.focus) {
            *d = true;
        }
        self.error = None;
    }

    /// Type into the focused field. Flags and choices react to space only.
    pub fn input_char(&mut self, c: char) {
        if self.is_submitting() {
            return;
        }
        let Some(spec) = self.focused().copied() else {
            return;
        };
        match spec.kind {
            FieldKind::Flag | FieldKind::Choice(_) => {
                if c == ' ' {
                    self.cycle(1);
                }
            }
            FieldKind::Integer { .. } => {
                if c.is_ascii_digit() || c == '-' {
                    self.values[self.focus].push(c);
                    self.touch();
                }
            }
            FieldKind::Text | FieldKind::Secret | FieldKind::Date => {
                self.values[self.focus].push(c);
                self.touch();
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.is_submitting() {
            return;
        }
        let editable = matches!(
            self.focused().map(|s| s.kind),
            Some(FieldKind::Text | FieldKind::Secret | FieldKind::Date | FieldKind::Integer { .. })
        );
        if editable && self.values[self.focus].pop().is_some() {
            self.touch();
        }
    }

    /// Step a flag or choice field forward (`1`) or back (`-1`).
    pub fn cycle(&mut self, step: isize) {
        if self.is_submitting() {
            return;
        }
        let Some(spec) = self.focused().copied() else {
            return;
        };
        let options: &[&str] = match spec.kind {
            FieldKind::Flag => &["false", "true"],
            FieldKind::Choice(opts) => opts,
            _ => return,
        };
        if options.is_empty() {
            return;
        }
        let current = &self.values[self.focus];
        let pos = options.iter().position(|o| o.eq_ignore_ascii_case(current)).unwrap_or(0) as isize;
        let len = options.len() as isize;
        let next = (pos + step).rem_euclid(len) as usize;
        self.values[self.focus] = options[next].to_string();
        self.touch();
    }

    /// Value as drawn: secrets masked.
    pub fn display_value(&self, idx: usize) -> String {
        let v = self.values.get(idx).cloned().unwrap_or_default();
        match self.fields.get(idx).map(|f| f.kind) {
            Some(FieldKind::Secret) => "*".repeat(v.chars().count()),
            _ => v,
        }
    }
}

/// A form bound to a record type: `base` is the row being edited (or the default
/// for a new one) and carries server-only fields through an update.
#[derive(Clone, Debug)]
pub struct EntityForm<E: Entity> {
    base: E,
    pub state: FormState,
}

impl<E: Entity> EntityForm<E> {
    pub fn create() -> Self {
        Self::create_from(E::default())
    }

    /// New-record form starting from the values of `base`.
    pub fn create_from(base: E) -> Self {
        let fields: Vec<FieldSpec> = E::fields().to_vec();
        let values = fields.iter().map(|f| initial_value(&base, f)).collect();
        Self {
            state: FormState::new(E::KIND, FormMode::Create, fields, values),
            base,
        }
    }

    /// Prefilled from `record`; only fields editable on update are shown.
    pub fn edit(record: &E) -> Self {
        let fields: Vec<FieldSpec> = E::fields().iter().filter(|f| f.on_update).copied().collect();
        let values = fields.iter().map(|f| initial_value(record, f)).collect();
        Self {
            state: FormState::new(E::KIND, FormMode::Edit { id: record.id() }, fields, values),
            base: record.clone(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.state.mode
    }

    /// The record to submit. A create applies every field; an edit only the ones the
    /// user touched, so untouched values go back exactly as they were loaded.
    pub fn build(&self) -> Result<E, ValidationError> {
        let mut record = self.base.clone();
        let apply_all = self.state.mode == FormMode::Create;
        for (i, spec) in self.state.fields.iter().enumerate() {
            if apply_all || self.state.is_dirty(i) {
                record.set_field(spec.key, &self.state.values[i])?;
            }
        }
        Ok(record)
    }
}

fn initial_value<E: Entity>(record: &E, spec: &FieldSpec) -> String {
    match spec.kind {
        FieldKind::Secret => String::new(),
        _ => record.field(spec.key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Room, User};
    use serde_json::Value;

    fn focus_key(state: &mut FormState, key: &str) {
        state.focus = state.fields.iter().position(|f| f.key == key).unwrap();
    }

    fn type_str(state: &mut FormState, s: &str) {
        for c in s.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn edit_form_hides_create_only_fields_and_keeps_untouched_values() {
        let mut user = User {
            id: 9,
            name: "Old".into(),
            email: "old@x.io".into(),
            ..User::default()
        };
        user.extra.insert("avatar".into(), Value::from("a.png"));
        let mut form = EntityForm::edit(&user);
        assert!(form.state.fields.iter().all(|f| f.key != "password"));
        assert_eq!(form.mode(), FormMode::Edit { id: 9 });

        focus_key(&mut form.state, "name");
        form.state.values[form.state.focus].clear();
        type_str(&mut form.state, "New");
        assert_eq!(form.state.dirty_count(), 1);

        let built = form.build().unwrap();
        assert_eq!(built.name, "New");
        assert_eq!(built.email, "old@x.io");
        assert_eq!(built.extra.get("avatar"), Some(&Value::from("a.png")));
    }

    #[test]
    fn create_form_applies_every_field() {
        let mut form = EntityForm::<Room>::create();
        assert_eq!(form.state.title(), "New room");
        // guests default "0" is outside 1..=100
        assert_eq!(form.build().unwrap_err().field, "khach");
        focus_key(&mut form.state, "khach");
        form.state.backspace();
        type_str(&mut form.state, "4x");
        assert_eq!(form.state.values[form.state.focus], "4");
        assert_eq!(form.build().unwrap().guests, 4);
    }

    #[test]
    fn flags_and_choices_cycle() {
        let mut form = EntityForm::<Room>::create();
        focus_key(&mut form.state, "wifi");
        form.state.input_char(' ');
        assert_eq!(form.state.values[form.state.focus], "true");
        form.state.cycle(-1);
        assert_eq!(form.state.values[form.state.focus], "false");

        let mut form = EntityForm::<User>::create();
        focus_key(&mut form.state, "role");
        assert_eq!(form.state.values[form.state.focus], "USER");
        form.state.cycle(1);
        assert_eq!(form.state.values[form.state.focus], "ADMIN");
    }

    #[test]
    fn secrets_are_masked_and_locked_while_submitting() {
        let mut form = EntityForm::<User>::create();
        focus_key(&mut form.state, "password");
        type_str(&mut form.state, "abc");
        assert_eq!(form.state.display_value(form.state.focus), "***");
        form.state.submitting = Some(3);
        form.state.input_char('d');
        assert_eq!(form.state.values[form.state.focus], "abc");
    }

    #[test]
    fn focus_wraps() {
        let mut form = EntityForm::<Location>::create();
        form.state.focus_prev();
        assert_eq!(form.state.focus, 3);
        form.state.focus_next();
        assert_eq!(form.state.focus, 0);
    }
}
