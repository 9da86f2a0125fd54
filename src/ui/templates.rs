// Askama template definitions

use askama::Template;

use crate::db::TicketView;
use crate::ui::Flash;

// Landing page
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub notice: Option<Flash>,
}

// Registration form
#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub notice: Option<Flash>,
}

// Login form
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub notice: Option<Flash>,
}

// Patient dashboard: the caller's own tickets
#[derive(Template)]
#[template(path = "patient_dashboard.html")]
pub struct PatientTemplate {
    pub user: String,
    pub tokens: Vec<TicketView>,
    pub notice: Option<Flash>,
}

// Doctor dashboard: every ticket with its owner
#[derive(Template)]
#[template(path = "doctor_dashboard.html")]
pub struct DoctorTemplate {
    pub user: String,
    pub tokens: Vec<TicketView>,
    pub notice: Option<Flash>,
}
