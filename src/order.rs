//! Order driver: create an order, drive it to `ready`, finalize with a
//! CSR, poll to `valid`, and download the certificate chain.

use std::path::Path;

use log::info;

use crate::authz;
use crate::csr;
use crate::error::{Error, Result};
use crate::jose;
use crate::key::KeyPair;
use crate::poll::Deadline;
use crate::session::Session;
use crate::types::{FinalizePayload, Identifier, NewOrderPayload, Order, OrderStatus};

/// Run the full `issue` flow for `names` (first element is the common
/// name) and persist the resulting chain under `certdir/cert.pem`.
pub fn issue(
    session: &mut Session,
    names: &[String],
    domain_key: &KeyPair,
    hook_path: Option<&std::path::PathBuf>,
    certdir: &Path,
) -> Result<()> {
    let url = session.directory.new_order.clone();
    let payload = NewOrderPayload {
        identifiers: names.iter().map(|n| Identifier::dns(n.clone())).collect(),
    };
    info!("creating new order for {} at {url}", names[0]);
    let resp = session.post_signed(&url, Some(&payload))?;
    if resp.status != 201 {
        return Err(resp.protocol_error(&url));
    }
    let mut order: Order = resp.json()?;
    match order.status {
        OrderStatus::Pending | OrderStatus::Ready => {}
        other => {
            return Err(Error::Config(format!(
                "invalid order status ({other:?})"
            )))
        }
    }
    let order_url = resp
        .header("location")
        .ok_or(Error::MissingHeader("Location"))?
        .to_string();
    info!("order URL: {order_url}");

    if order.status == OrderStatus::Pending {
        let thumbprint = jose::thumbprint(&session.key)?;
        authz::authorize(
            session,
            &order.authorizations,
            hook_path.map(|p| p.as_path()),
            &thumbprint,
        )?;
        order = poll_order(session, &order_url, OrderStatus::Ready, &[OrderStatus::Pending])?;
    }

    info!("generating certificate request");
    let csr_der_b64 = csr::generate_csr(names, domain_key)?;

    let finalize_url = order
        .finalize
        .clone()
        .ok_or_else(|| Error::Config("failed to find finalize URL".into()))?;
    info!("finalizing order at {finalize_url}");
    let resp = session.post_signed(
        &finalize_url,
        Some(&FinalizePayload { csr: csr_der_b64 }),
    )?;
    if resp.status != 200 {
        return Err(resp.protocol_error(&finalize_url));
    }

    let order = poll_order(session, &order_url, OrderStatus::Valid, &[OrderStatus::Processing])?;

    let cert_url = order
        .certificate
        .clone()
        .ok_or_else(|| Error::Config("failed to parse certificate url".into()))?;
    info!("retrieving certificate at {cert_url}");
    let resp = session.post_as_get(&cert_url)?;
    if resp.status != 200 {
        return Err(resp.protocol_error(&cert_url));
    }
    csr::save_certificate(&resp.body, certdir)?;

    Ok(())
}

fn poll_order(
    session: &mut Session,
    url: &str,
    target: OrderStatus,
    continue_on: &[OrderStatus],
) -> Result<Order> {
    let deadline = Deadline::start(format!("order {url}"));
    loop {
        info!("polling order status at {url}");
        let resp = session.post_as_get(url)?;
        if resp.status != 200 {
            return Err(resp.protocol_error(url));
        }
        let order: Order = resp.json()?;
        if order.status == target {
            return Ok(order);
        }
        if continue_on.contains(&order.status) {
            deadline.wait()?;
            continue;
        }
        return Err(Error::Config(format!(
            "unexpected order status ({:?}) at {url}",
            order.status
        )));
    }
}

/// `revoke`: POST the re-encoded certificate DER and a reason code to the
/// CA's `revokeCert` endpoint.
pub fn revoke(session: &mut Session, certfile: &Path, reason: u32) -> Result<()> {
    let url = session.directory.revoke_cert.clone();
    let crt = csr::cert_der_base64url(certfile)?;
    info!("revoking {} at {url}", certfile.display());
    let resp = session.post_signed(
        &url,
        Some(&crate::types::RevokeCertPayload {
            certificate: crt,
            reason,
        }),
    )?;
    if resp.status != 200 {
        return Err(resp.protocol_error(&url));
    }
    info!("revoked {}", certfile.display());
    Ok(())
}
