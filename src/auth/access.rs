//! Which roles may call which routes.

use crate::types::Role;

/// Office roles allowed to browse the dashboard pages
pub const OFFICE: &[Role] = &[
    Role::Admin,
    Role::ResponsableTechnique,
    Role::ChargeEtude,
    Role::AssistanteDirections,
    Role::Rrh,
];

pub const USER_READERS: &[Role] = &[Role::Admin, Role::Rrh, Role::AssistanteDirections];
pub const USER_WRITERS: &[Role] = &[Role::Admin];

pub const PERSONNEL_WRITERS: &[Role] = &[Role::Admin, Role::Rrh];

pub const BON_CREATORS: &[Role] = &[Role::Admin, Role::ResponsableTechnique, Role::ChargeEtude];
/// Editing covers invoicing, hence RRH
pub const BON_EDITORS: &[Role] = &[Role::Admin, Role::Rrh];

pub const INTERVENTION_READERS: &[Role] = &[
    Role::Admin,
    Role::ResponsableTechnique,
    Role::ChargeEtude,
    Role::AssistanteDirections,
    Role::Rrh,
    Role::Technicien,
];
pub const INTERVENTION_CREATORS: &[Role] = &[Role::Admin, Role::ResponsableTechnique, Role::ChargeEtude];
pub const INTERVENTION_EDITORS: &[Role] = &[Role::Admin, Role::ResponsableTechnique];

pub const OBSERVATION_WRITERS: &[Role] = &[Role::Admin, Role::ResponsableTechnique, Role::ChargeEtude];

pub const CLIENT_WRITERS: &[Role] = &[Role::Admin, Role::ResponsableTechnique, Role::ChargeEtude];

pub const FIELD_SYNC: &[Role] = &[Role::Technicien];
