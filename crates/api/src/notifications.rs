//! Composition of customer and operator emails.
//!
//! Lifecycle handlers pass these builders to the transition, which enqueues
//! the resulting outbox rows in its own transaction. Each message carries a
//! dedupe key derived from the reservation id and the message kind, so a
//! retried transition cannot queue the same email twice.

use goldipuppy_core::contact::ContactForm;
use goldipuppy_core::lifecycle::ReleaseReason;
use goldipuppy_db::models::notification::{NewOutboxMessage, NotificationTransport};
use goldipuppy_db::models::puppy::Puppy;
use goldipuppy_db::models::reservation::Reservation;
use goldipuppy_events::OutgoingEmail;
use serde_json::json;

use crate::config::StoreConfig;

/// Operator alert and customer confirmation for a new reservation.
pub fn reservation_messages(
    store: &StoreConfig,
    puppy: &Puppy,
    reservation: Option<&Reservation>,
) -> Vec<NewOutboxMessage> {
    let Some(r) = reservation else {
        return Vec::new();
    };
    let params = template_params(store, puppy, r);
    let due = r.deposit_due_at.format("%Y-%m-%d %H:%M UTC");

    let operator = NewOutboxMessage {
        dedupe_key: dedupe_key(r, "operator_alert"),
        transport: NotificationTransport::EmailService,
        recipient: store.operator_email.clone(),
        subject: format!("New reservation: {}", puppy.name),
        html_body: format!(
            "<h2>New reservation</h2>\
             <p><strong>{puppy}</strong> ({breed}) was reserved by {name} &lt;{email}&gt;.</p>\
             <p>Phone: {phone}</p>\
             <p>Message: {message}</p>\
             <p>Reference: <strong>{reference}</strong>, deposit due {due}.</p>",
            puppy = escape_html(&puppy.name),
            breed = escape_html(&puppy.breed),
            name = escape_html(&r.customer_name),
            email = escape_html(&r.customer_email),
            phone = escape_html(r.customer_phone.as_deref().unwrap_or("-")),
            message = escape_html(r.message.as_deref().unwrap_or("-")),
            reference = escape_html(&r.deposit_reference),
        ),
        template_params: params.clone(),
    };

    let bank = &store.bank;
    let customer = NewOutboxMessage {
        dedupe_key: dedupe_key(r, "customer_confirmation"),
        transport: NotificationTransport::EmailService,
        recipient: r.customer_email.clone(),
        subject: format!("Your reservation of {}", puppy.name),
        html_body: format!(
            "<p>Dear {name},</p>\
             <p>Thank you for reserving <strong>{puppy}</strong>. To hold your puppy, please \
             transfer the deposit of <strong>{amount} {currency}</strong> by {due}.</p>\
             <table>\
             <tr><td>Account holder</td><td>{holder}</td></tr>\
             <tr><td>IBAN</td><td>{iban}</td></tr>\
             <tr><td>BIC</td><td>{bic}</td></tr>\
             <tr><td>Bank</td><td>{bank_name}</td></tr>\
             <tr><td>Reference</td><td><strong>{reference}</strong></td></tr>\
             </table>\
             <p>Please quote the reference so we can match your payment.</p>",
            name = escape_html(&r.customer_name),
            puppy = escape_html(&puppy.name),
            amount = store.deposit_amount,
            currency = escape_html(&puppy.currency),
            holder = escape_html(&bank.account_holder),
            iban = escape_html(&bank.iban),
            bic = escape_html(&bank.bic),
            bank_name = escape_html(&bank.bank_name),
            reference = escape_html(&r.deposit_reference),
        ),
        template_params: params,
    };

    vec![operator, customer]
}

/// Customer notice that the deposit arrived.
pub fn deposit_received_messages(
    store: &StoreConfig,
    puppy: &Puppy,
    reservation: Option<&Reservation>,
) -> Vec<NewOutboxMessage> {
    let Some(r) = reservation else {
        return Vec::new();
    };
    vec![NewOutboxMessage {
        dedupe_key: dedupe_key(r, "deposit_received"),
        transport: NotificationTransport::EmailService,
        recipient: r.customer_email.clone(),
        subject: format!("Deposit received for {}", puppy.name),
        html_body: format!(
            "<p>Dear {name},</p>\
             <p>We received your deposit for <strong>{puppy}</strong> \
             (reference {reference}). Your puppy is now held for you.</p>",
            name = escape_html(&r.customer_name),
            puppy = escape_html(&puppy.name),
            reference = escape_html(&r.deposit_reference),
        ),
        template_params: template_params(store, puppy, r),
    }]
}

/// Notice sent when a hold is released.
///
/// The customer hears about operator and sweep releases; the operator hears
/// about customer cancellations.
pub fn release_messages(
    store: &StoreConfig,
    reason: ReleaseReason,
    puppy: &Puppy,
    reservation: Option<&Reservation>,
) -> Vec<NewOutboxMessage> {
    let Some(r) = reservation else {
        return Vec::new();
    };
    let params = template_params(store, puppy, r);
    let message = match reason {
        ReleaseReason::CustomerCancelled => NewOutboxMessage {
            dedupe_key: dedupe_key(r, "customer_cancelled"),
            transport: NotificationTransport::EmailService,
            recipient: store.operator_email.clone(),
            subject: format!("Reservation cancelled: {}", puppy.name),
            html_body: format!(
                "<p>{name} &lt;{email}&gt; cancelled the reservation of \
                 <strong>{puppy}</strong> (reference {reference}).</p>",
                name = escape_html(&r.customer_name),
                email = escape_html(&r.customer_email),
                puppy = escape_html(&puppy.name),
                reference = escape_html(&r.deposit_reference),
            ),
            template_params: params,
        },
        ReleaseReason::Expired | ReleaseReason::Cancelled => {
            let why = match reason {
                ReleaseReason::Expired => "the deposit was not received by the due date",
                _ => "it was cancelled by our team",
            };
            NewOutboxMessage {
                dedupe_key: dedupe_key(r, "released"),
                transport: NotificationTransport::EmailService,
                recipient: r.customer_email.clone(),
                subject: format!("Your reservation of {} has ended", puppy.name),
                html_body: format!(
                    "<p>Dear {name},</p>\
                     <p>Your reservation of <strong>{puppy}</strong> (reference {reference}) \
                     has been released because {why}. Please contact us if you have questions.</p>",
                    name = escape_html(&r.customer_name),
                    puppy = escape_html(&puppy.name),
                    reference = escape_html(&r.deposit_reference),
                ),
                template_params: params,
            }
        }
    };
    vec![message]
}

/// Contact-form message for the operator.
pub fn contact_email(store: &StoreConfig, form: &ContactForm) -> OutgoingEmail {
    let field = |v: &Option<String>| escape_html(v.as_deref().unwrap_or("-"));
    let subject = form
        .subject
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("Contact form: {s}"))
        .unwrap_or_else(|| "Contact form enquiry".to_string());

    let puppy = form
        .puppy_id
        .map(|id| format!("<p>About puppy: {id}</p>"))
        .unwrap_or_default();

    OutgoingEmail {
        to: store.operator_email.clone(),
        subject,
        html_body: format!(
            "<h2>New enquiry</h2>\
             <p>Name: {name}</p>\
             <p>Email: {email}</p>\
             <p>Phone: {phone}</p>\
             {puppy}\
             <p>{message}</p>",
            name = field(&form.name),
            email = field(&form.email),
            phone = field(&form.phone),
            message = field(&form.message),
        ),
        template_params: json!({}),
        reply_to: form.email.clone(),
    }
}

fn dedupe_key(reservation: &Reservation, kind: &str) -> String {
    format!("reservation:{}:{kind}", reservation.id)
}

fn template_params(store: &StoreConfig, puppy: &Puppy, r: &Reservation) -> serde_json::Value {
    json!({
        "reservation_id": r.id,
        "puppy_id": puppy.id,
        "puppy_name": puppy.name,
        "puppy_breed": puppy.breed,
        "customer_name": r.customer_name,
        "customer_email": r.customer_email,
        "customer_phone": r.customer_phone,
        "message": r.message,
        "deposit_reference": r.deposit_reference,
        "deposit_due_at": r.deposit_due_at,
        "deposit_amount": store.deposit_amount.to_string(),
        "currency": puppy.currency,
        "bank_account_holder": store.bank.account_holder,
        "bank_iban": store.bank.iban,
        "bank_bic": store.bank.bic,
        "bank_name": store.bank.bank_name,
    })
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
