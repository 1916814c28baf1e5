mod certificate;
