//! Message texts for chat and email notifications.

use crate::error::AgentError;
use crate::notify::traits::OutgoingEmail;
use crate::store::{RateReading, Recipient};
use bcv_scrape::RateQuote;

/// Chat text announcing a newly recorded rate.
pub fn rate_recorded(quote: &RateQuote) -> String {
    format!("Tasa BCV del {}: Bs {}", quote.date_key(), quote.rate)
}

/// Chat text for a run whose observation date was already on file.
pub fn rate_already_recorded(quote: &RateQuote) -> String {
    format!(
        "Tasa BCV del {} ya estaba registrada (Bs {}). No se enviaron correos.",
        quote.date_key(),
        quote.rate
    )
}

/// Chat text for a run that failed before anything was recorded.
pub fn run_failed(err: &AgentError) -> String {
    format!("Error en agente BCV: {err}")
}

/// Personalized email for one recipient.
pub fn rate_email(
    reading: &RateReading,
    recipient: &Recipient,
    signature: &str,
) -> OutgoingEmail {
    let date = reading.date_key();
    let body = format!(
        "Apreciad@ {name},\n\
         \n\
         Anexo la última tasa de $ descargada del BCV para la fecha {date}.\n\
         \n\
         Tasa oficial: Bs {rate:.4}\n\
         \n\
         En caso de algún comentario, favor contactarme por {contact}.\n\
         \n\
         Saludos cordiales,\n\
         {signature}\n",
        name = recipient.display_name,
        rate = reading.rate,
        contact = recipient.contact_phrase,
    );
    OutgoingEmail {
        to: recipient.email_address.clone(),
        subject: format!("Tasa BCV del {date}"),
        body,
    }
}
