//! S1AP Message Builders
//!
//! Downlink NAS Transport encoding and decoding.
//!
//! ```text
//! PDU:   type(1) | procedure code(1) | criticality(1) | value length | value
//! value: IE count(3) | IE | IE | IE
//! IE:    id(2) | criticality(1) | payload length | payload
//! ```
//!
//! The width of the length fields depends on [`S1apLengthLayout`].

use bytes::Bytes;
use ogs_core::OgsPkbuf;

use crate::error::{S1apError, S1apResult};
use crate::types::*;

/// Largest UE S1AP ID accepted by the encoder
pub const S1AP_UE_ID_MAX: u32 = 0xffff;

/// Largest length an aligned PER length determinant can carry
pub const APER_LENGTH_MAX: usize = 16383;

fn check_ue_id(ie: &'static str, value: u32) -> S1apResult<()> {
    if value > S1AP_UE_ID_MAX {
        return Err(S1apError::UeIdOutOfRange { ie, value });
    }
    Ok(())
}

fn put_ie_length(
    pkbuf: &mut OgsPkbuf,
    ie: &'static str,
    len: usize,
    layout: S1apLengthLayout,
) -> S1apResult<()> {
    match layout {
        S1apLengthLayout::Aper => {
            let len = u8::try_from(len).map_err(|_| S1apError::IeTooLong {
                ie,
                len,
                max: u8::MAX as usize,
            })?;
            pkbuf.put_u8(len)?;
        }
        S1apLengthLayout::Canonical => {
            let len = u16::try_from(len).map_err(|_| S1apError::IeTooLong {
                ie,
                len,
                max: u16::MAX as usize,
            })?;
            pkbuf.put_u16(len)?;
        }
    }
    Ok(())
}

/// Append a UE S1AP ID IE: one octet below 0x100, two octets otherwise.
fn put_ue_id_ie(
    pkbuf: &mut OgsPkbuf,
    id: u16,
    ie: &'static str,
    value: u32,
    layout: S1apLengthLayout,
) -> S1apResult<()> {
    check_ue_id(ie, value)?;
    pkbuf.put_u16(id)?;
    pkbuf.put_u8(Criticality::Reject as u8)?;
    if value <= 0xff {
        put_ie_length(pkbuf, ie, 1, layout)?;
        pkbuf.put_u8(value as u8)?;
    } else {
        put_ie_length(pkbuf, ie, 2, layout)?;
        pkbuf.put_u16(value as u16)?;
    }
    Ok(())
}

fn put_nas_pdu_ie(pkbuf: &mut OgsPkbuf, nas_pdu: &[u8], layout: S1apLengthLayout) -> S1apResult<()> {
    const IE: &str = "NAS-PDU";

    pkbuf.put_u16(protocol_ie_id::NAS_PDU)?;
    pkbuf.put_u8(Criticality::Reject as u8)?;
    match layout {
        S1apLengthLayout::Aper => {
            // The value repeats the octet string length
            if nas_pdu.len() >= u8::MAX as usize {
                return Err(S1apError::IeTooLong {
                    ie: IE,
                    len: nas_pdu.len(),
                    max: u8::MAX as usize - 1,
                });
            }
            put_ie_length(pkbuf, IE, nas_pdu.len() + 1, layout)?;
            pkbuf.put_u8(nas_pdu.len() as u8)?;
        }
        S1apLengthLayout::Canonical => put_ie_length(pkbuf, IE, nas_pdu.len(), layout)?,
    }
    pkbuf.put_data(nas_pdu)?;
    Ok(())
}

fn put_value_length(pkbuf: &mut OgsPkbuf, len: usize, layout: S1apLengthLayout) -> S1apResult<()> {
    match layout {
        S1apLengthLayout::Aper => {
            if len < 0x80 {
                pkbuf.put_u8(len as u8)?;
            } else if len <= APER_LENGTH_MAX {
                pkbuf.put_u16(0x8000 | len as u16)?;
            } else {
                return Err(S1apError::ValueTooLong { len, max: APER_LENGTH_MAX });
            }
        }
        S1apLengthLayout::Canonical => {
            let len = u16::try_from(len).map_err(|_| S1apError::ValueTooLong {
                len,
                max: u16::MAX as usize,
            })?;
            pkbuf.put_u16(len)?;
        }
    }
    Ok(())
}

/// Build a Downlink NAS Transport PDU.
///
/// The IE container is written into `value`, the complete PDU into `pdu`.
/// Both buffers are expected to be empty. On error their content is
/// undefined and must not be sent.
pub fn build_downlink_nas_transport_with_ids(
    mme_ue_s1ap_id: u32,
    enb_ue_s1ap_id: u32,
    nas_pdu: &[u8],
    layout: S1apLengthLayout,
    value: &mut OgsPkbuf,
    pdu: &mut OgsPkbuf,
) -> S1apResult<()> {
    value.put_u24(S1AP_DL_NAS_TRANSPORT_IE_COUNT)?;
    put_ue_id_ie(value, protocol_ie_id::MME_UE_S1AP_ID, "MME-UE-S1AP-ID", mme_ue_s1ap_id, layout)?;
    put_ue_id_ie(value, protocol_ie_id::ENB_UE_S1AP_ID, "eNB-UE-S1AP-ID", enb_ue_s1ap_id, layout)?;
    put_nas_pdu_ie(value, nas_pdu, layout)?;

    pdu.put_u8(PduType::InitiatingMessage as u8)?;
    pdu.put_u8(procedure_code::DOWNLINK_NAS_TRANSPORT)?;
    pdu.put_u8(Criticality::Ignore as u8)?;
    put_value_length(pdu, value.len(), layout)?;
    pdu.put_data(value.as_slice())?;
    Ok(())
}

/// Build a Downlink NAS Transport PDU into freshly allocated buffers.
pub fn build_dl_nas_transport(msg: &DlNasTransport, layout: S1apLengthLayout) -> S1apResult<Bytes> {
    let mut value = OgsPkbuf::new(msg.nas_pdu.len() + 32);
    let mut pdu = OgsPkbuf::new(msg.nas_pdu.len() + 40);
    build_downlink_nas_transport_with_ids(
        msg.mme_ue_s1ap_id,
        msg.enb_ue_s1ap_id,
        &msg.nas_pdu,
        layout,
        &mut value,
        &mut pdu,
    )?;
    Ok(pdu.freeze())
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> S1apResult<&'a [u8]> {
        let data = self.data;
        let bytes = data.get(self.pos..self.pos + n).ok_or(S1apError::BufferTooShort {
            expected: self.pos + n,
            actual: data.len(),
        })?;
        self.pos += n;
        Ok(bytes)
    }

    fn u8(&mut self) -> S1apResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> S1apResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u24(&mut self) -> S1apResult<u32> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    fn ie_length(&mut self, layout: S1apLengthLayout) -> S1apResult<usize> {
        match layout {
            S1apLengthLayout::Aper => Ok(self.u8()? as usize),
            S1apLengthLayout::Canonical => Ok(self.u16()? as usize),
        }
    }

    fn value_length(&mut self, layout: S1apLengthLayout) -> S1apResult<usize> {
        match layout {
            S1apLengthLayout::Aper => {
                let first = self.u8()?;
                if first & 0x80 == 0 {
                    Ok(first as usize)
                } else {
                    let second = self.u8()?;
                    Ok((((first & 0x3f) as usize) << 8) | second as usize)
                }
            }
            S1apLengthLayout::Canonical => Ok(self.u16()? as usize),
        }
    }
}

/// Decode the protocol IEs of a Downlink NAS Transport PDU, in wire order.
///
/// The NAS-PDU value is returned without the repeated length octet of the
/// `Aper` layout.
pub fn decode_protocol_ies(bytes: &[u8], layout: S1apLengthLayout) -> S1apResult<Vec<ProtocolIe>> {
    let mut reader = Reader::new(bytes);
    let pdu_type = reader.u8()?;
    let code = reader.u8()?;
    if pdu_type != PduType::InitiatingMessage as u8 || code != procedure_code::DOWNLINK_NAS_TRANSPORT {
        return Err(S1apError::UnexpectedPdu { pdu_type, procedure_code: code });
    }
    Criticality::try_from(reader.u8()?)?;

    let declared = reader.value_length(layout)?;
    if declared != reader.remaining() {
        return Err(S1apError::LengthMismatch { declared, actual: reader.remaining() });
    }

    let count = reader.u24()?;
    let mut ies = Vec::with_capacity(count.min(S1AP_DL_NAS_TRANSPORT_IE_COUNT) as usize);
    for _ in 0..count {
        let id = reader.u16()?;
        let criticality = Criticality::try_from(reader.u8()?)?;
        let len = reader.ie_length(layout)?;
        let payload = reader.take(len)?;

        let value = if id == protocol_ie_id::NAS_PDU && layout == S1apLengthLayout::Aper {
            let (&inner, rest) = payload.split_first().ok_or(S1apError::BufferTooShort {
                expected: 1,
                actual: 0,
            })?;
            if inner as usize != rest.len() {
                return Err(S1apError::LengthMismatch {
                    declared: inner as usize,
                    actual: rest.len(),
                });
            }
            rest.to_vec()
        } else {
            payload.to_vec()
        };
        ies.push(ProtocolIe { id, criticality, value });
    }

    if reader.remaining() != 0 {
        return Err(S1apError::LengthMismatch {
            declared: reader.pos,
            actual: bytes.len(),
        });
    }
    Ok(ies)
}

fn ue_id_value(ie_name: &'static str, value: &[u8]) -> S1apResult<u32> {
    if value.is_empty() || value.len() > 4 {
        return Err(S1apError::InvalidIeValue {
            ie_name,
            reason: format!("{} octets", value.len()),
        });
    }
    Ok(value.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
}

/// Decode a Downlink NAS Transport PDU.
///
/// The three mandatory IEs must appear exactly once each, in the order
/// MME-UE-S1AP-ID, eNB-UE-S1AP-ID, NAS-PDU.
pub fn decode_downlink_nas_transport(
    bytes: &[u8],
    layout: S1apLengthLayout,
) -> S1apResult<DlNasTransport> {
    let ies = decode_protocol_ies(bytes, layout)?;
    let mut iter = ies.into_iter();

    let mme = iter
        .next()
        .filter(|ie| ie.id == protocol_ie_id::MME_UE_S1AP_ID)
        .ok_or(S1apError::MissingMandatoryIe("MME-UE-S1AP-ID"))?;
    let enb = iter
        .next()
        .filter(|ie| ie.id == protocol_ie_id::ENB_UE_S1AP_ID)
        .ok_or(S1apError::MissingMandatoryIe("eNB-UE-S1AP-ID"))?;
    let nas = iter
        .next()
        .filter(|ie| ie.id == protocol_ie_id::NAS_PDU)
        .ok_or(S1apError::MissingMandatoryIe("NAS-PDU"))?;
    if let Some(extra) = iter.next() {
        return Err(S1apError::InvalidIeValue {
            ie_name: "protocolIEs",
            reason: format!("unexpected IE {}", extra.id),
        });
    }

    Ok(DlNasTransport {
        mme_ue_s1ap_id: ue_id_value("MME-UE-S1AP-ID", &mme.value)?,
        enb_ue_s1ap_id: ue_id_value("eNB-UE-S1AP-ID", &enb.value)?,
        nas_pdu: nas.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(mme: u32, enb: u32, nas: &[u8]) -> DlNasTransport {
        DlNasTransport { mme_ue_s1ap_id: mme, enb_ue_s1ap_id: enb, nas_pdu: nas.to_vec() }
    }

    #[test]
    fn test_build_aper_layout() {
        let pdu = build_dl_nas_transport(&msg(7, 42, &[0xaa, 0xbb]), S1apLengthLayout::Aper).unwrap();
        assert_eq!(
            &pdu[..],
            &[
                0x00, 0x0b, 0x01, 0x14, // type, procedure, criticality, value length
                0x00, 0x00, 0x03, // IE count
                0x00, 0x00, 0x00, 0x01, 0x07, // MME-UE-S1AP-ID
                0x00, 0x08, 0x00, 0x01, 0x2a, // eNB-UE-S1AP-ID
                0x00, 0x1a, 0x00, 0x03, 0x02, 0xaa, 0xbb, // NAS-PDU
            ][..]
        );
    }

    #[test]
    fn test_build_canonical_layout() {
        let pdu =
            build_dl_nas_transport(&msg(0x1234, 1, &[0xaa]), S1apLengthLayout::Canonical).unwrap();
        assert_eq!(
            &pdu[..],
            &[
                0x00, 0x0b, 0x01, 0x00, 0x16, // type, procedure, criticality, value length
                0x00, 0x00, 0x03, // IE count
                0x00, 0x00, 0x00, 0x00, 0x02, 0x12, 0x34, // MME-UE-S1AP-ID
                0x00, 0x08, 0x00, 0x00, 0x01, 0x01, // eNB-UE-S1AP-ID
                0x00, 0x1a, 0x00, 0x00, 0x01, 0xaa, // NAS-PDU
            ][..]
        );
    }

    #[test]
    fn test_ue_id_minimal_encoding() {
        let mut value = OgsPkbuf::new(32);
        put_ue_id_ie(&mut value, 0, "MME-UE-S1AP-ID", 0xff, S1apLengthLayout::Aper).unwrap();
        put_ue_id_ie(&mut value, 0, "MME-UE-S1AP-ID", 0x100, S1apLengthLayout::Aper).unwrap();
        assert_eq!(value.as_slice(), &[0, 0, 0, 1, 0xff, 0, 0, 0, 2, 0x01, 0x00]);
    }

    #[test]
    fn test_ue_id_out_of_range() {
        let err = build_dl_nas_transport(&msg(0x10000, 1, &[]), S1apLengthLayout::Aper).unwrap_err();
        assert_eq!(err, S1apError::UeIdOutOfRange { ie: "MME-UE-S1AP-ID", value: 0x10000 });

        let err = build_dl_nas_transport(&msg(1, u32::MAX, &[]), S1apLengthLayout::Canonical)
            .unwrap_err();
        assert_eq!(err, S1apError::UeIdOutOfRange { ie: "eNB-UE-S1AP-ID", value: u32::MAX });
    }

    #[test]
    fn test_aper_long_value_length() {
        let nas = vec![0x5a; 255];
        let err = build_dl_nas_transport(&msg(1, 1, &nas), S1apLengthLayout::Aper).unwrap_err();
        assert_eq!(err, S1apError::IeTooLong { ie: "NAS-PDU", len: 255, max: 254 });

        let nas = vec![0x5a; 200];
        let pdu = build_dl_nas_transport(&msg(1, 1, &nas), S1apLengthLayout::Aper).unwrap();
        // 218 octets of value need the two-octet determinant
        assert_eq!(&pdu[3..5], &[0x80, 0xda]);
        assert_eq!(decode_downlink_nas_transport(&pdu, S1apLengthLayout::Aper).unwrap().nas_pdu, nas);

        let mut pdu = OgsPkbuf::new(8);
        put_value_length(&mut pdu, 200, S1apLengthLayout::Aper).unwrap();
        assert_eq!(pdu.as_slice(), &[0x80, 0xc8]);
        pdu.clear();
        put_value_length(&mut pdu, 127, S1apLengthLayout::Aper).unwrap();
        assert_eq!(pdu.as_slice(), &[0x7f]);
        assert_eq!(
            put_value_length(&mut pdu, APER_LENGTH_MAX + 1, S1apLengthLayout::Aper),
            Err(S1apError::ValueTooLong { len: APER_LENGTH_MAX + 1, max: APER_LENGTH_MAX })
        );
    }

    #[test]
    fn test_canonical_large_nas_pdu() {
        let nas = vec![0x5a; 300];
        let pdu = build_dl_nas_transport(&msg(1, 2, &nas), S1apLengthLayout::Canonical).unwrap();
        let decoded = decode_downlink_nas_transport(&pdu, S1apLengthLayout::Canonical).unwrap();
        assert_eq!(decoded.nas_pdu, nas);
    }

    #[test]
    fn test_decode_roundtrip_both_layouts() {
        for layout in [S1apLengthLayout::Aper, S1apLengthLayout::Canonical] {
            let original = msg(0xabcd, 3, &[0x37, 1, 2, 3, 4, 5]);
            let pdu = build_dl_nas_transport(&original, layout).unwrap();
            assert_eq!(decode_downlink_nas_transport(&pdu, layout).unwrap(), original);

            let ies = decode_protocol_ies(&pdu, layout).unwrap();
            let ids: Vec<u16> = ies.iter().map(|ie| ie.id).collect();
            assert_eq!(ids, vec![0, 8, 26]);
            assert!(ies.iter().all(|ie| ie.criticality == Criticality::Reject));
        }
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let pdu = build_dl_nas_transport(&msg(1, 2, &[9, 9]), S1apLengthLayout::Aper).unwrap();

        assert!(matches!(
            decode_downlink_nas_transport(&pdu[..pdu.len() - 1], S1apLengthLayout::Aper),
            Err(S1apError::LengthMismatch { .. })
        ));

        let mut wrong_proc = pdu.to_vec();
        wrong_proc[1] = 13;
        assert_eq!(
            decode_downlink_nas_transport(&wrong_proc, S1apLengthLayout::Aper),
            Err(S1apError::UnexpectedPdu { pdu_type: 0, procedure_code: 13 })
        );

        let mut swapped = pdu.to_vec();
        swapped[8] = 8; // first IE now claims to be eNB-UE-S1AP-ID
        assert_eq!(
            decode_downlink_nas_transport(&swapped, S1apLengthLayout::Aper),
            Err(S1apError::MissingMandatoryIe("MME-UE-S1AP-ID"))
        );

        let mut bad_inner = pdu.to_vec();
        let inner = bad_inner.len() - 3;
        bad_inner[inner] = 5;
        assert!(matches!(
            decode_downlink_nas_transport(&bad_inner, S1apLengthLayout::Aper),
            Err(S1apError::LengthMismatch { declared: 5, actual: 2 })
        ));
    }

    #[test]
    fn test_build_no_tailroom() {
        let mut value = OgsPkbuf::new(16);
        let mut pdu = OgsPkbuf::new(16);
        let nas = [0u8; 200];
        let err = build_downlink_nas_transport_with_ids(
            1,
            1,
            &nas,
            S1apLengthLayout::Canonical,
            &mut value,
            &mut pdu,
        )
        .unwrap_err();
        assert!(matches!(err, S1apError::Encoding(_)));
    }
}
