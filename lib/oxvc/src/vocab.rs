//! Provides ready to use [`NamedNodeRef`](oxrdf::NamedNodeRef)s for the credential vocabularies.

pub mod cred {
    //! [W3C verifiable credentials](https://www.w3.org/2018/credentials#) vocabulary.
    use oxrdf::NamedNodeRef;

    /// The class of verifiable credentials.
    pub const VERIFIABLE_CREDENTIAL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/2018/credentials#VerifiableCredential");
    /// The class of verifiable presentations.
    pub const VERIFIABLE_PRESENTATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/2018/credentials#VerifiablePresentation");
    /// The entity the credential claims are about.
    pub const CREDENTIAL_SUBJECT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/2018/credentials#credentialSubject");
    /// The entity that issued the credential.
    pub const ISSUER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/2018/credentials#issuer");
    /// The instant from which the credential is valid.
    pub const ISSUANCE_DATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/2018/credentials#issuanceDate");
    /// The instant after which the credential is no longer valid.
    pub const EXPIRATION_DATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/2018/credentials#expirationDate");
    /// The entity holding the credential.
    pub const HOLDER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://www.w3.org/2018/credentials#holder");
}

pub mod sec {
    //! [W3C security](https://w3id.org/security#) vocabulary subset used by proof blocks.
    use oxrdf::NamedNodeRef;

    /// Links a document to its integrity proof.
    pub const PROOF: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("https://w3id.org/security#proof");
    /// The class of data integrity proofs.
    pub const DATA_INTEGRITY_PROOF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/security#DataIntegrityProof");
    /// The purpose a proof was created for.
    pub const PROOF_PURPOSE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/security#proofPurpose");
    /// The assertion proof purpose.
    pub const ASSERTION_METHOD: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/security#assertionMethod");
    /// The verification method a proof relies on.
    pub const VERIFICATION_METHOD: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/security#verificationMethod");
}

pub mod ctzn {
    //! [W3C citizenship](https://w3id.org/citizenship#) vocabulary subset.
    use oxrdf::NamedNodeRef;

    /// The class of permanent residents.
    pub const PERMANENT_RESIDENT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/citizenship#PermanentResident");
    /// The class of permanent resident cards.
    pub const PERMANENT_RESIDENT_CARD: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/citizenship#PermanentResidentCard");
    /// The country a person was born in.
    pub const BIRTH_COUNTRY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/citizenship#birthCountry");
    /// The commuter classification of a resident.
    pub const COMMUTER_CLASSIFICATION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/citizenship#commuterClassification");
    /// The lawful permanent resident category code.
    pub const LPR_CATEGORY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/citizenship#lprCategory");
    /// The lawful permanent resident card number.
    pub const LPR_NUMBER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/citizenship#lprNumber");
    /// The instant since which a person has been a resident.
    pub const RESIDENT_SINCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/citizenship#residentSince");
}
