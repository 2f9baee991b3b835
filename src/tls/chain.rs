//! Certificate chain cleaning (§4.3 "Chain cleaning"): starting from the
//! leaf, walk to a trusted root, bounded to 9 iterations.

use x509_parser::certificate::X509Certificate;

use super::error::TrustError;

const MAX_ITERATIONS: usize = 9;

/// Clean `chain` (leaf-first) against `trusted_roots`, returning the
/// leaf-to-root path actually used for trust. `min_intermediate_ca`
/// enforces `basicConstraints.pathLenConstraint >= min_intermediate_ca`
/// on each intermediate accepted along the way.
pub fn clean<'a>(
    chain: &[X509Certificate<'a>],
    trusted_roots: &[X509Certificate<'a>],
    min_intermediate_ca: u32,
) -> Result<Vec<X509Certificate<'a>>, TrustError> {
    let mut cleaned: Vec<X509Certificate<'a>> = Vec::new();
    let mut remaining: Vec<&X509Certificate<'a>> = chain.iter().collect();
    let Some(leaf) = remaining.first().copied() else {
        return Err(TrustError::ChainCleaningFailed { max_iterations: MAX_ITERATIONS });
    };
    remaining.remove(0);
    cleaned.push(leaf.clone());

    if is_self_signed(leaf) && trusted_roots.iter().any(|r| same_subject(r, leaf)) {
        return Ok(cleaned);
    }

    let mut current = leaf;
    for _ in 0..MAX_ITERATIONS {
        if let Some(root) = trusted_roots.iter().find(|r| issues(r, current)) {
            cleaned.push(root.clone());
            return Ok(cleaned);
        }

        let next_idx = remaining.iter().position(|candidate| {
            issues(candidate, current) && has_sufficient_path_len(candidate, min_intermediate_ca)
        });
        match next_idx {
            Some(idx) => {
                let next = remaining.remove(idx);
                cleaned.push(next.clone());
                if is_self_signed(next) {
                    return Ok(cleaned);
                }
                current = next;
            }
            None => return Err(TrustError::ChainCleaningFailed { max_iterations: MAX_ITERATIONS }),
        }
    }
    Err(TrustError::ChainCleaningFailed { max_iterations: MAX_ITERATIONS })
}

fn same_subject(a: &X509Certificate, b: &X509Certificate) -> bool {
    a.subject() == b.subject()
}

fn issues(signer: &X509Certificate, subject: &X509Certificate) -> bool {
    signer.subject() == subject.issuer() && verifies_signature(signer, subject)
}

fn is_self_signed(cert: &X509Certificate) -> bool {
    cert.subject() == cert.issuer()
}

fn has_sufficient_path_len(cert: &X509Certificate, min_intermediate_ca: u32) -> bool {
    match basic_constraints(cert) {
        Some((is_ca, path_len)) => is_ca && path_len.unwrap_or(u32::MAX) >= min_intermediate_ca,
        None => false,
    }
}

fn basic_constraints(cert: &X509Certificate) -> Option<(bool, Option<u32>)> {
    let (_critical, bc) = cert.basic_constraints().ok()??;
    Some((bc.ca, bc.path_len_constraint))
}

/// Verify that `signer`'s public key validates `subject`'s TBS signature,
/// for the RSA-PKCS1 and ECDSA P-256/P-384 algorithms `ring` supports.
/// Any other algorithm fails closed (§4.3.1): a trust decision is never
/// made on a signature this crate could not actually check.
fn verifies_signature(signer: &X509Certificate, subject: &X509Certificate) -> bool {
    use x509_parser::oid_registry::*;

    let alg = &subject.signature_algorithm.algorithm;
    let verification_alg: &dyn ring::signature::VerificationAlgorithm = if *alg == OID_PKCS1_SHA256WITHRSA {
        &ring::signature::RSA_PKCS1_2048_8192_SHA256
    } else if *alg == OID_PKCS1_SHA384WITHRSA {
        &ring::signature::RSA_PKCS1_2048_8192_SHA384
    } else if *alg == OID_PKCS1_SHA512WITHRSA {
        &ring::signature::RSA_PKCS1_2048_8192_SHA512
    } else if *alg == OID_SIG_ECDSA_WITH_SHA256 {
        &ring::signature::ECDSA_P256_SHA256_ASN1
    } else if *alg == OID_SIG_ECDSA_WITH_SHA384 {
        &ring::signature::ECDSA_P384_SHA384_ASN1
    } else {
        return false;
    };

    let public_key = signer.tbs_certificate.subject_pki.subject_public_key.as_ref();
    let signature = subject.signature_value.as_ref();
    ring::signature::UnparsedPublicKey::new(verification_alg, public_key)
        .verify(subject.tbs_certificate.as_ref(), signature)
        .is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_chain_fails() {
        let empty: Vec<X509Certificate> = Vec::new();
        assert!(clean(&empty, &[], 0).is_err());
    }
}
