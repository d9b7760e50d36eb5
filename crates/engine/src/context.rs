//! Request-scoped state shared by the report pipelines.

use std::io::Write;

use anyhow::Result;
use panzer_api::{CfClient, Session};

use crate::settings::ReportSettings;

/// Everything a report needs for one invocation: the API client, the
/// session it was built from, the settings and the writer tables go to.
pub struct ReportContext<W> {
    pub client: CfClient,
    pub session: Session,
    pub settings: ReportSettings,
    out: W,
}

impl<W: Write> ReportContext<W> {
    pub fn new(session: Session, settings: ReportSettings, out: W) -> Result<Self> {
        let client = CfClient::new(&session, &settings.client_settings())?;
        Ok(Self {
            client,
            session,
            settings,
            out,
        })
    }

    /// Name of the logged-in user, for the report banners.
    pub fn username(&self) -> String {
        self.session.username()
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
